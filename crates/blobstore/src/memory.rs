//! In-memory implementation of [`ObjectStore`].
//!
//! This is a lightweight implementation for development use only.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow, bail};
use bytes::{Bytes, BytesMut};
use fromenv::FromEnv;
use futures::{FutureExt, StreamExt, stream};
use parking_lot::RwLock;
use subkit::Backend;
use tracing::instrument;

use crate::store::{ByteStream, FutureResult, ObjectInfo, ObjectStore};

/// Size of the chunks handed out by [`MemoryStore::get_object`].
const CHUNK_SIZE: usize = 64 * 1024;

/// Options used to create a [`MemoryStore`].
#[derive(Debug, Clone, FromEnv)]
pub struct ConnectOptions {
    /// Bucket name reported in logs.
    #[env(from = "BLOBSTORE_BUCKET", default = "default")]
    pub bucket: String,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            bucket: "default".to_string(),
        }
    }
}

#[allow(missing_docs)]
impl subkit::FromEnv for ConnectOptions {
    fn from_env() -> Result<Self> {
        Self::from_env().finalize().context("issue loading blobstore options")
    }
}

/// A bucket held in memory.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    bucket: String,
    objects: Arc<RwLock<BTreeMap<String, StoredObject>>>,
}

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    created_at: u64,
}

impl StoredObject {
    fn info(&self, name: String) -> ObjectInfo {
        ObjectInfo {
            name,
            size: self.data.len() as u64,
            created_at: self.created_at,
        }
    }
}

impl Backend for MemoryStore {
    type ConnectOptions = ConnectOptions;

    #[instrument]
    async fn connect_with(options: Self::ConnectOptions) -> Result<Self> {
        tracing::debug!("initializing in-memory blobstore bucket: {}", options.bucket);
        Ok(Self {
            bucket: options.bucket,
            objects: Arc::new(RwLock::new(BTreeMap::new())),
        })
    }
}

impl MemoryStore {
    /// Bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

impl ObjectStore for MemoryStore {
    fn put_object(
        &self, name: String, mut body: ByteStream, size: Option<u64>,
    ) -> FutureResult<ObjectInfo> {
        tracing::debug!("putting object: {name} into bucket: {}", self.bucket);
        let objects = Arc::clone(&self.objects);

        async move {
            let mut data = BytesMut::new();
            while let Some(chunk) = body.next().await {
                let chunk = chunk.with_context(|| format!("reading body of {name}"))?;
                data.extend_from_slice(&chunk);
            }

            if let Some(expected) = size
                && expected != data.len() as u64
            {
                bail!("object {name}: expected {expected} bytes, received {}", data.len());
            }

            let object = StoredObject {
                data: data.freeze(),
                created_at: now(),
            };
            let info = object.info(name.clone());
            {
                let mut objects = objects.write();
                objects.insert(name, object)
            };
            Ok(info)
        }
        .boxed()
    }

    fn get_object(&self, name: String) -> FutureResult<ByteStream> {
        tracing::debug!("getting object: {name} from bucket: {}", self.bucket);
        let objects = Arc::clone(&self.objects);

        async move {
            let data = {
                let objects = objects.read();
                objects.get(&name).map(|o| o.data.clone())
            }
            .ok_or_else(|| anyhow!("object not found: {name}"))?;

            let chunks = (0..data.len())
                .step_by(CHUNK_SIZE)
                .map(move |start| {
                    let end = data.len().min(start + CHUNK_SIZE);
                    Ok::<_, anyhow::Error>(data.slice(start..end))
                })
                .collect::<Vec<_>>();
            Ok(stream::iter(chunks).boxed())
        }
        .boxed()
    }

    fn stat_object(&self, name: String) -> FutureResult<ObjectInfo> {
        tracing::debug!("getting info for object: {name} in bucket: {}", self.bucket);
        let objects = Arc::clone(&self.objects);

        async move {
            let objects = objects.read();
            let object = objects.get(&name).ok_or_else(|| anyhow!("object not found: {name}"))?;
            Ok(object.info(name))
        }
        .boxed()
    }

    fn remove_object(&self, name: String) -> FutureResult<()> {
        tracing::debug!("deleting object: {name} from bucket: {}", self.bucket);
        let objects = Arc::clone(&self.objects);

        async move {
            {
                let mut objects = objects.write();
                objects.remove(&name)
            };
            Ok(())
        }
        .boxed()
    }

    fn list_objects(&self, prefix: String) -> FutureResult<Vec<ObjectInfo>> {
        tracing::debug!("listing objects with prefix: {prefix} in bucket: {}", self.bucket);
        let objects = Arc::clone(&self.objects);

        async move {
            let objects = objects.read();
            Ok(objects
                .range(prefix.clone()..)
                .take_while(|(name, _)| name.starts_with(&prefix))
                .map(|(name, object)| object.info(name.clone()))
                .collect())
        }
        .boxed()
    }
}

fn now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(parts: &[&[u8]]) -> ByteStream {
        let chunks = parts.iter().map(|p| Ok(Bytes::copy_from_slice(p))).collect::<Vec<_>>();
        stream::iter(chunks).boxed()
    }

    #[tokio::test]
    async fn object_operations() {
        let store = MemoryStore::connect_with(ConnectOptions::default()).await.expect("connect");

        // Test put and get
        let info = store
            .put_object("a/one".to_string(), body(&[b"hello ", b"world"]), None)
            .await
            .expect("put object");
        assert_eq!(info.size, 11);

        let mut stream = store.get_object("a/one".to_string()).await.expect("get object");
        let mut data = Vec::new();
        while let Some(chunk) = stream.next().await {
            data.extend_from_slice(&chunk.expect("chunk"));
        }
        assert_eq!(data, b"hello world");

        // Test list by prefix
        store.put_object("a/two".to_string(), body(&[b"2"]), Some(1)).await.expect("put object");
        store.put_object("b/three".to_string(), body(&[b"3"]), None).await.expect("put object");
        let names = store
            .list_objects("a/".to_string())
            .await
            .expect("list objects")
            .into_iter()
            .map(|o| o.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["a/one".to_string(), "a/two".to_string()]);

        // Test remove
        store.remove_object("a/one".to_string()).await.expect("remove object");
        assert!(store.stat_object("a/one".to_string()).await.is_err());
        store.remove_object("a/one".to_string()).await.expect("remove missing object");
    }

    #[tokio::test]
    async fn size_mismatch_is_rejected() {
        let store = MemoryStore::connect_with(ConnectOptions::default()).await.expect("connect");
        let result = store.put_object("x".to_string(), body(&[b"abc"]), Some(4)).await;
        assert!(result.is_err());
        assert!(store.stat_object("x".to_string()).await.is_err());
    }

    #[tokio::test]
    async fn large_objects_are_chunked() {
        let store = MemoryStore::connect_with(ConnectOptions::default()).await.expect("connect");
        let payload = vec![7_u8; CHUNK_SIZE * 2 + 1];
        store.put_object("big".to_string(), body(&[&payload]), None).await.expect("put object");

        let chunks = store
            .get_object("big".to_string())
            .await
            .expect("get object")
            .collect::<Vec<_>>()
            .await;
        assert_eq!(chunks.len(), 3);
    }
}
