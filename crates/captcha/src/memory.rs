//! In-memory implementation of [`CodeStore`].
//!
//! This is a lightweight implementation for development use only.

use std::time::Duration;

use anyhow::{Context, Result};
use fromenv::FromEnv;
use futures::FutureExt;
use moka::sync::Cache;
use subkit::Backend;
use tracing::instrument;

use crate::store::{CodeStore, FutureResult};

/// Options used to create a [`MemoryCodeStore`].
#[derive(Debug, Clone, FromEnv)]
pub struct ConnectOptions {
    /// Seconds a code stays valid after it is issued.
    #[env(from = "CAPTCHA_TTL_SECS", default = "300")]
    pub ttl_secs: u64,
    /// Codes held at once; the least recently used are evicted beyond this.
    #[env(from = "CAPTCHA_MAX_ENTRIES", default = "10240")]
    pub max_entries: u64,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            max_entries: 10_240,
        }
    }
}

#[allow(missing_docs)]
impl subkit::FromEnv for ConnectOptions {
    fn from_env() -> Result<Self> {
        Self::from_env().finalize().context("issue loading captcha options")
    }
}

/// Codes held in an expiring in-memory cache.
#[derive(Clone)]
pub struct MemoryCodeStore {
    cache: Cache<String, String>,
}

impl std::fmt::Debug for MemoryCodeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCodeStore")
            .field("entries", &self.cache.entry_count())
            .finish_non_exhaustive()
    }
}

impl Backend for MemoryCodeStore {
    type ConnectOptions = ConnectOptions;

    #[instrument]
    async fn connect_with(options: Self::ConnectOptions) -> Result<Self> {
        tracing::debug!("initializing in-memory code store, ttl: {}s", options.ttl_secs);
        Ok(Self {
            cache: Cache::builder()
                .max_capacity(options.max_entries)
                .time_to_live(Duration::from_secs(options.ttl_secs))
                .build(),
        })
    }
}

impl CodeStore for MemoryCodeStore {
    fn set(&self, id: String, code: String) -> FutureResult<()> {
        tracing::debug!("storing code for: {id}");
        self.cache.insert(id, code);
        async move { Ok(()) }.boxed()
    }

    fn get(&self, id: String) -> FutureResult<Option<String>> {
        tracing::debug!("reading code for: {id}");
        let code = self.cache.get(&id);
        async move { Ok(code) }.boxed()
    }

    fn delete(&self, id: String) -> FutureResult<()> {
        tracing::debug!("deleting code for: {id}");
        self.cache.invalidate(&id);
        async move { Ok(()) }.boxed()
    }
}
