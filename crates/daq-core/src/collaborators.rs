//! External collaborators of the emission loop.
//!
//! The loop talks to two services: an S3-compatible [`ObjectStore`] holding
//! rendered events and a [`MessageBus`] carrying descriptors and status
//! lines. The traits abstract the transport so the loop can be exercised
//! end-to-end against [`MemoryObjectStore`] and [`MemoryBus`]; the binary
//! supplies the MinIO and NATS implementations.
//!
//! Both traits return `Send` futures so an injector can be driven from a
//! spawned task.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Errors reported by an [`ObjectStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The target bucket does not exist.
    #[error("bucket {bucket} does not exist")]
    NoSuchBucket {
        /// Bucket name.
        bucket: String,
    },

    /// The store rejected or failed a request.
    #[error("object store {operation} failed: {message}")]
    Request {
        /// Operation that failed (`put`, `presign`, ...).
        operation: &'static str,
        /// Description of the failure.
        message: String,
    },
}

/// Error reported by a [`MessageBus`].
#[derive(Debug, thiserror::Error)]
#[error("publish to {topic} failed: {message}")]
pub struct BusError {
    /// Topic the message was addressed to.
    pub topic: String,
    /// Description of the failure.
    pub message: String,
}

/// Bucketed blob storage with presigned retrieval.
pub trait ObjectStore {
    /// Whether `bucket` exists.
    fn bucket_exists(&self, bucket: &str) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Create `bucket`.
    fn create_bucket(&self, bucket: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Store `payload` under `key` in `bucket`.
    fn put(
        &self,
        bucket: &str,
        key: &str,
        payload: &[u8],
        content_type: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// A URL that retrieves `key` without further credentials until `ttl`
    /// elapses.
    fn presigned_get(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> impl Future<Output = Result<String, StoreError>> + Send;
}

/// Topic-addressed publish.
pub trait MessageBus {
    /// Publish `payload` on `topic`.
    fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
    ) -> impl Future<Output = Result<(), BusError>> + Send;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object bytes.
    pub payload: Vec<u8>,
    /// MIME type given at upload.
    pub content_type: String,
}

/// An [`ObjectStore`] held in process memory.
///
/// Presigned URLs use the `memory://<bucket>/<key>` scheme.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    buckets: Mutex<BTreeMap<String, BTreeMap<String, StoredObject>>>,
}

impl MemoryObjectStore {
    /// Create an empty store with no buckets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `bucket` has been created.
    pub fn has_bucket(&self, bucket: &str) -> bool {
        lock(&self.buckets).contains_key(bucket)
    }

    /// The object stored under `key` in `bucket`, if any.
    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        lock(&self.buckets)
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .cloned()
    }

    /// Keys stored in `bucket`, in lexicographic order.
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        lock(&self.buckets)
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl ObjectStore for MemoryObjectStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StoreError> {
        Ok(self.has_bucket(bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        lock(&self.buckets).entry(bucket.to_owned()).or_default();
        Ok(())
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        payload: &[u8],
        content_type: &str,
    ) -> Result<(), StoreError> {
        let mut buckets = lock(&self.buckets);
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| StoreError::NoSuchBucket {
                bucket: bucket.to_owned(),
            })?;
        objects.insert(
            key.to_owned(),
            StoredObject {
                payload: payload.to_vec(),
                content_type: content_type.to_owned(),
            },
        );
        Ok(())
    }

    async fn presigned_get(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> Result<String, StoreError> {
        if !self.has_bucket(bucket) {
            return Err(StoreError::NoSuchBucket {
                bucket: bucket.to_owned(),
            });
        }
        Ok(format!("memory://{bucket}/{key}?expires={}", ttl.as_secs()))
    }
}

/// A published message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    /// Topic the message was published on.
    pub topic: String,
    /// Message bytes.
    pub payload: Vec<u8>,
}

/// A [`MessageBus`] that records every publish in memory.
///
/// [`MemoryBus::failing_after`] builds a bus that rejects publishes once a
/// number of them have succeeded.
#[derive(Debug, Default)]
pub struct MemoryBus {
    published: Mutex<Vec<Published>>,
    fail_after: Option<usize>,
}

impl MemoryBus {
    /// Create a bus that accepts every publish.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bus that accepts `count` publishes and rejects the rest.
    pub fn failing_after(count: usize) -> Self {
        Self {
            published: Mutex::default(),
            fail_after: Some(count),
        }
    }

    /// Every accepted message, in publish order.
    pub fn published(&self) -> Vec<Published> {
        lock(&self.published).clone()
    }

    /// Payloads accepted on `topic`, in publish order.
    pub fn payloads(&self, topic: &str) -> Vec<Vec<u8>> {
        lock(&self.published)
            .iter()
            .filter(|message| message.topic == topic)
            .map(|message| message.payload.clone())
            .collect()
    }

    /// Payloads accepted on `topic` decoded as UTF-8 text.
    pub fn lines(&self, topic: &str) -> Vec<String> {
        self.payloads(topic)
            .into_iter()
            .map(|payload| String::from_utf8_lossy(&payload).into_owned())
            .collect()
    }
}

impl MessageBus for MemoryBus {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BusError> {
        let mut published = lock(&self.published);
        if self.fail_after.is_some_and(|limit| published.len() >= limit) {
            return Err(BusError {
                topic: topic.to_owned(),
                message: "bus unavailable".to_owned(),
            });
        }
        published.push(Published {
            topic: topic.to_owned(),
            payload,
        });
        Ok(())
    }
}
