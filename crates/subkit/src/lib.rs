//! # subkit
//!
//! Shared plumbing for the subkit helper crates.
//!
//! Backend implementations (object stores, SQL connections, code stores)
//! connect through [`Backend`], reading their options via [`FromEnv`].
//! Asynchronous collaborator traits return a boxed [`FutureResult`] so they
//! stay object safe.

#![forbid(unsafe_code)]

pub mod telemetry;
mod traits;

pub use self::traits::*;
