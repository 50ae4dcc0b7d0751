//! S3-backed artifact store.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use gc_core::{ArtifactStore, GcError, Result};
use tracing::debug;

use crate::aws::aws_err;

/// Corrected artifacts stored as objects in an S3 bucket.
pub struct S3ArtifactStore {
    client: Client,
    bucket: String,
}

impl S3ArtifactStore {
    pub fn new(config: &aws_types::SdkConfig, bucket: String) -> Self {
        Self {
            client: Client::new(config),
            bucket,
        }
    }
}

#[async_trait]
impl ArtifactStore for S3ArtifactStore {
    async fn get_object(&self, key: &str) -> Result<Option<String>> {
        let output = match self.client.get_object().bucket(&self.bucket).key(key).send().await {
            Ok(output) => output,
            Err(e) => {
                if let Some(service_err) = e.as_service_error() {
                    if service_err.is_no_such_key() {
                        debug!(bucket = %self.bucket, key, "Object does not exist");
                        return Ok(None);
                    }
                }
                return Err(aws_err(e));
            }
        };

        let bytes = output.body.collect().await.map_err(aws_err)?.into_bytes();
        String::from_utf8(bytes.to_vec())
            .map(Some)
            .map_err(|e| GcError::Storage(format!("Object {} is not valid UTF-8: {}", key, e)))
    }

    async fn put_object(&self, key: &str, content: &str) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(content.as_bytes().to_vec()))
            .send()
            .await
            .map_err(aws_err)?;
        Ok(())
    }
}
