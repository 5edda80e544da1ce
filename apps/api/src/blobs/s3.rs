use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use futures::StreamExt;
use tokio_util::io::ReaderStream;
use tracing::info;

use crate::blobs::{BlobStream, ObjectStore, StorageError};

/// [`ObjectStore`] over an S3 bucket (AWS or MinIO).
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        S3ObjectStore {
            client,
            bucket: bucket.into(),
        }
    }

    /// Constructs an S3 client configured for MinIO (local) or AWS (production).
    pub async fn connect(
        endpoint: &str,
        access_key_id: &str,
        secret_access_key: &str,
        bucket: &str,
    ) -> Self {
        let credentials = Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "jobboard-static",
        );

        let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .load()
            .await;

        info!("S3 client initialized for bucket {bucket}");
        Self::new(Client::new(&s3_config), bucket)
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, key: &str, bytes: Bytes) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .if_none_match("*")
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().and_then(|se| se.code()) == Some("PreconditionFailed") {
                    StorageError::AlreadyExists(key.to_string())
                } else {
                    StorageError::Backend(format!("S3 upload of '{key}' failed: {e}"))
                }
            })?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<BlobStream, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().map(|se| se.is_no_such_key()) == Some(true) {
                    StorageError::NotFound(key.to_string())
                } else {
                    StorageError::Backend(format!("S3 download of '{key}' failed: {e}"))
                }
            })?;

        Ok(ReaderStream::new(output.body.into_async_read()).boxed())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        // S3 reports success for keys that do not exist.
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("S3 delete of '{key}' failed: {e}")))?;
        Ok(())
    }
}
