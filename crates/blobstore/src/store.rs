use std::fmt::Debug;
use std::pin::Pin;

use bytes::Bytes;
use futures::Stream;
pub use subkit::FutureResult;

/// A stream of object body chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = anyhow::Result<Bytes>> + Send>>;

/// Metadata describing a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Object key.
    pub name: String,
    /// Size of the object body in bytes.
    pub size: u64,
    /// Creation time in seconds since the Unix epoch.
    pub created_at: u64,
}

/// Object-storage providers implement [`ObjectStore`] so archives can be
/// streamed to and from a bucket without touching local disk.
///
/// A store is bound to a single bucket; object names are keys within it.
pub trait ObjectStore: Debug + Send + Sync + 'static {
    /// Upload `body` as `name`, replacing any existing object.
    ///
    /// `size` is the body length when known up front. Streams of unknown
    /// length pass `None`.
    fn put_object(&self, name: String, body: ByteStream, size: Option<u64>)
    -> FutureResult<ObjectInfo>;

    /// Download the body of `name` as a stream.
    fn get_object(&self, name: String) -> FutureResult<ByteStream>;

    /// Metadata for `name`.
    fn stat_object(&self, name: String) -> FutureResult<ObjectInfo>;

    /// Delete `name`. Deleting a missing object is not an error.
    fn remove_object(&self, name: String) -> FutureResult<()>;

    /// Objects whose names start with `prefix`, ordered by name.
    fn list_objects(&self, prefix: String) -> FutureResult<Vec<ObjectInfo>>;
}
