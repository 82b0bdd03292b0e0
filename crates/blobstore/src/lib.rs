//! # Object storage
//!
//! The narrow object-storage interface used to stream compressed archives to
//! and from a bucket, plus an in-memory backend.

#![forbid(unsafe_code)]

mod memory;
mod store;

pub use memory::{ConnectOptions, MemoryStore};
pub use store::{ByteStream, FutureResult, ObjectInfo, ObjectStore};
