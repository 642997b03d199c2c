// Object-storage backend for accumulation files
//
// Credentials, region and endpoint are fixed at construction; the bucket
// is supplied on every call because payers and stages write to different
// buckets. Bucket handles are cheap to build, so one is created per
// operation instead of being cached.

use crate::config::ObjectStoreConfig;
use crate::errors::StorageError;
use crate::storage::handler::{decode_latin1, FileStore};
use async_trait::async_trait;
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::region::Region;
use tracing::{debug, error, instrument};

/// ObjectStore talks to an S3-compatible accumulation bucket
#[derive(Clone, Debug)]
pub struct ObjectStore {
    credentials: Credentials,
    region: String,
    endpoint: String,
}

impl ObjectStore {
    #[instrument(skip(config), fields(endpoint = %config.endpoint))]
    pub fn new(config: &ObjectStoreConfig) -> Result<Self, StorageError> {
        // Region::Custom expects the endpoint without a scheme.
        let endpoint = config
            .endpoint
            .trim_start_matches("http://")
            .trim_start_matches("https://")
            .to_string();

        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| {
            error!(error = %e, "Failed to create object storage credentials");
            StorageError::Credentials(format!("create credentials: {}", e))
        })?;

        Ok(Self {
            credentials,
            region: config.region.clone(),
            endpoint,
        })
    }

    fn bucket(&self, name: &str) -> Result<Bucket, StorageError> {
        let region = Region::Custom {
            region: self.region.clone(),
            endpoint: self.endpoint.clone(),
        };
        let bucket = Bucket::new(name, region, self.credentials.clone())
            .map_err(|e| {
                error!(error = %e, bucket = %name, "Failed to open bucket");
                StorageError::ObjectStore(format!("open bucket '{}': {}", name, e))
            })?
            .with_path_style();
        Ok(bucket)
    }
}

#[async_trait]
impl FileStore for ObjectStore {
    #[instrument(skip(self, content), fields(filename = %filename, bucket = %bucket, size = content.len()))]
    async fn upload(
        &self,
        content: &str,
        filename: &str,
        bucket: &str,
    ) -> Result<(), StorageError> {
        let handle = self.bucket(bucket)?;
        handle
            .put_object_with_content_type(filename, content.as_bytes(), "text/plain")
            .await
            .map_err(|e| {
                error!(error = %e, filename = %filename, bucket = %bucket, "Failed to upload accumulation file");
                StorageError::ObjectStore(format!(
                    "upload '{}' to bucket '{}': {}",
                    filename, bucket, e
                ))
            })?;
        debug!(filename = %filename, bucket = %bucket, "Accumulation file uploaded");
        Ok(())
    }

    #[instrument(skip(self), fields(filename = %filename, bucket = %bucket))]
    async fn download(&self, filename: &str, bucket: &str) -> Result<String, StorageError> {
        let handle = self.bucket(bucket)?;
        let response = handle.get_object(filename).await.map_err(|e| {
            error!(error = %e, filename = %filename, bucket = %bucket, "Failed to download accumulation file");
            StorageError::ObjectStore(format!(
                "download '{}' from bucket '{}': {}",
                filename, bucket, e
            ))
        })?;
        Ok(decode_latin1(response.bytes()))
    }

    #[instrument(skip(self), fields(prefix = %prefix, bucket = %bucket))]
    async fn list_files(&self, prefix: &str, bucket: &str) -> Result<Vec<String>, StorageError> {
        // Delimited listing returns direct children only, matching the
        // local backend's single-directory view.
        let normalized = if prefix.ends_with('/') {
            prefix.to_string()
        } else {
            format!("{}/", prefix)
        };

        let handle = self.bucket(bucket)?;
        let pages = handle
            .list(normalized, Some("/".to_string()))
            .await
            .map_err(|e| {
                error!(error = %e, prefix = %prefix, bucket = %bucket, "Failed to list accumulation files");
                StorageError::ObjectStore(format!(
                    "list '{}' in bucket '{}': {}",
                    prefix, bucket, e
                ))
            })?;

        let mut files = Vec::new();
        for page in pages {
            for object in page.contents {
                files.push(object.key);
            }
        }
        Ok(files)
    }

    #[instrument(skip(self), fields(old_filename = %old_filename, new_filename = %new_filename, bucket = %bucket))]
    async fn move_file(
        &self,
        old_filename: &str,
        new_filename: &str,
        bucket: &str,
    ) -> Result<(), StorageError> {
        let handle = self.bucket(bucket)?;

        // S3 has no rename; copy server-side, then delete the source.
        handle
            .copy_object_internal(old_filename, new_filename)
            .await
            .map_err(|e| {
                error!(
                    error = %e,
                    old_filename = %old_filename,
                    new_filename = %new_filename,
                    bucket = %bucket,
                    "Failed to copy accumulation file"
                );
                StorageError::ObjectStore(format!(
                    "copy '{}' to '{}' in bucket '{}': {}",
                    old_filename, new_filename, bucket, e
                ))
            })?;

        handle.delete_object(old_filename).await.map_err(|e| {
            error!(
                error = %e,
                old_filename = %old_filename,
                bucket = %bucket,
                "Failed to delete source after copy"
            );
            StorageError::ObjectStore(format!(
                "delete '{}' from bucket '{}' after copy: {}",
                old_filename, bucket, e
            ))
        })?;

        debug!(
            old_filename = %old_filename,
            new_filename = %new_filename,
            bucket = %bucket,
            "Accumulation file moved"
        );
        Ok(())
    }
}
