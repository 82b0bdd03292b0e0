//! # Verification codes
//!
//! Issues short numeric codes, stores them with an expiry, and checks user
//! answers against them.
//!
//! ```ignore
//! use subkit::Backend;
//! use subkit_captcha::{MemoryCodeStore, Verifier};
//!
//! let verifier = Verifier::new(MemoryCodeStore::connect().await?);
//! let (id, code) = verifier.generate(6).await?;
//! // deliver `code` to the user, keep `id` with the session
//! assert!(verifier.verify(&id, &code, true).await);
//! ```

#![forbid(unsafe_code)]

mod memory;
mod store;
mod verifier;

pub use self::memory::{ConnectOptions, MemoryCodeStore};
pub use self::store::{CodeStore, FutureResult};
pub use self::verifier::{DEFAULT_CODE_LENGTH, Verifier};
