//! # Backend Traits
//!
//! Traits implemented by concrete backends (object stores, SQL connections,
//! verification-code stores) so callers can connect them uniformly.

use std::future::Future;

use anyhow::Result;
use futures::future::BoxFuture;

/// Result type for asynchronous operations.
pub type FutureResult<T> = BoxFuture<'static, Result<T>>;

/// Implemented by backend resources to allow them to be connected with options
/// loaded from the environment or supplied by the caller.
pub trait Backend: Sized + Sync + Send {
    /// The options used to connect to the backend.
    type ConnectOptions: FromEnv;

    /// Connect to the resource.
    #[must_use]
    fn connect() -> impl Future<Output = Result<Self>> {
        async { Self::connect_with(Self::ConnectOptions::from_env()?).await }
    }

    /// Connect to the resource with the specified options.
    fn connect_with(options: Self::ConnectOptions) -> impl Future<Output = Result<Self>>;
}

/// Trait for creating connection options from environment variables.
pub trait FromEnv: Sized {
    /// Create connection options from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    fn from_env() -> Result<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Options {
        label: String,
    }

    impl FromEnv for Options {
        fn from_env() -> Result<Self> {
            Ok(Self {
                label: "from-env".to_string(),
            })
        }
    }

    struct Probe {
        label: String,
    }

    impl Backend for Probe {
        type ConnectOptions = Options;

        async fn connect_with(options: Self::ConnectOptions) -> Result<Self> {
            Ok(Self { label: options.label })
        }
    }

    #[tokio::test]
    async fn connect_reads_options_from_env() {
        let probe = Probe::connect().await.expect("connect");
        assert_eq!(probe.label, "from-env");

        let probe = Probe::connect_with(Options::default()).await.expect("connect");
        assert!(probe.label.is_empty());
    }
}
