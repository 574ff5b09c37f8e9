//! MinIO (S3-compatible) implementation of the injector's object store.
//!
//! Requests use path-style addressing (`<endpoint>/<bucket>/<key>`), which
//! MinIO expects by default.

use std::time::Duration;

use daq_core::collaborators::{ObjectStore, StoreError};
use daq_core::config::ObjectStoreConfig;
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tracing::{debug, info};

/// Successful S3 status codes.
const SUCCESS: std::ops::Range<u16> = 200..300;

/// S3 client for a MinIO deployment.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    region: Region,
    credentials: Credentials,
}

impl S3ObjectStore {
    /// Build a client from configuration. No request is made.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Request`] if the credentials are rejected.
    pub fn new(config: &ObjectStoreConfig) -> Result<Self, StoreError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| request_error("credentials", &e))?;
        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint_url(),
        };
        info!(endpoint = %config.endpoint_url(), region = %config.region, "Object store client ready");
        Ok(Self {
            region,
            credentials,
        })
    }

    fn bucket(&self, name: &str) -> Result<Box<Bucket>, StoreError> {
        let bucket = Bucket::new(name, self.region.clone(), self.credentials.clone())
            .map_err(|e| request_error("bucket", &e))?;
        Ok(bucket.with_path_style())
    }
}

impl ObjectStore for S3ObjectStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StoreError> {
        self.bucket(bucket)?
            .exists()
            .await
            .map_err(|e| request_error("bucket_exists", &e))
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), StoreError> {
        let response = Bucket::create_with_path_style(
            bucket,
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await
        .map_err(|e| request_error("create_bucket", &e))?;
        if !response.success() {
            return Err(StoreError::Request {
                operation: "create_bucket",
                message: format!("{}: {}", response.response_code, response.response_text),
            });
        }
        info!(bucket = bucket, "Bucket created");
        Ok(())
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        payload: &[u8],
        content_type: &str,
    ) -> Result<(), StoreError> {
        let response = self
            .bucket(bucket)?
            .put_object_with_content_type(key, payload, content_type)
            .await
            .map_err(|e| request_error("put", &e))?;
        let status = response.status_code();
        if !SUCCESS.contains(&status) {
            return Err(StoreError::Request {
                operation: "put",
                message: format!("{key}: HTTP {status}"),
            });
        }
        debug!(bucket = bucket, key = key, bytes = payload.len(), "Object stored");
        Ok(())
    }

    async fn presigned_get(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> Result<String, StoreError> {
        let expiry = u32::try_from(ttl.as_secs()).map_err(|e| request_error("presign", &e))?;
        self.bucket(bucket)?
            .presign_get(key, expiry, None)
            .await
            .map_err(|e| request_error("presign", &e))
    }
}

fn request_error(operation: &'static str, err: &dyn std::fmt::Display) -> StoreError {
    StoreError::Request {
        operation,
        message: err.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn local() -> ObjectStoreConfig {
        ObjectStoreConfig {
            endpoint: "localhost:9000".to_owned(),
            ..ObjectStoreConfig::default()
        }
    }

    #[test]
    fn builds_without_network() {
        let store = S3ObjectStore::new(&local()).unwrap();
        assert!(matches!(store.region, Region::Custom { ref endpoint, .. } if endpoint == "http://localhost:9000"));
    }

    #[tokio::test]
    async fn presigned_url_is_path_style() {
        let store = S3ObjectStore::new(&local()).unwrap();
        let url = store
            .presigned_get("cygno-daq", "cygno-abc.jpg", Duration::from_secs(3600))
            .await
            .unwrap();
        assert!(url.starts_with("http://localhost:9000/cygno-daq/cygno-abc.jpg?"));
        assert!(url.contains("X-Amz-Expires=3600"));
    }

    #[tokio::test]
    #[ignore = "requires MinIO on localhost:9000 with minioadmin credentials"]
    async fn upload_round_trip() {
        let store = S3ObjectStore::new(&local()).unwrap();
        if !store.bucket_exists("daq-test").await.unwrap() {
            store.create_bucket("daq-test").await.unwrap();
        }
        assert!(store.bucket_exists("daq-test").await.unwrap());
        store
            .put("daq-test", "live-check.jpg", &[0xFF, 0xD8, 0xFF, 0xD9], "image/jpeg")
            .await
            .unwrap();
    }
}
