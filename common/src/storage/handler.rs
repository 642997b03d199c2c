// Accumulation file handler
//
// The single entry point jobs use to read, write, list and move payer
// accumulation files. The backend is chosen once at construction and every
// call after that dispatches through the FileStore trait; callers never
// branch on where the files actually live. File lifecycle (pending,
// processed, archived) is carried entirely by object-name prefixes owned
// by the calling jobs.

use crate::config::Settings;
use crate::errors::StorageError;
use crate::storage::local_store::LocalStore;
use crate::storage::object_store::ObjectStore;
use crate::telemetry;
use async_trait::async_trait;
use std::env;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Environment variable that forces the local-directory backend on
pub const FORCE_LOCAL_ENV: &str = "FORCE_LOCAL_ACCUMULATION_REPORTING";

/// Fixture filename that always routes to the local backend, so test runs
/// never touch a live bucket no matter how the handler was constructed
pub const TEST_FIXTURE_FILENAME: &str = "accumulation_test_fixture.txt";

/// FileStore is the backend seam for accumulation file operations.
///
/// `bucket` is supplied per call because different payers and stages write
/// to different buckets; the local backend ignores it and uses its
/// configured root directory instead.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Write `content` under `filename`, creating any missing hierarchy
    async fn upload(&self, content: &str, filename: &str, bucket: &str)
        -> Result<(), StorageError>;

    /// Read `filename` back as text
    async fn download(&self, filename: &str, bucket: &str) -> Result<String, StorageError>;

    /// List files directly under `prefix`, returned as `prefix/name` paths
    async fn list_files(&self, prefix: &str, bucket: &str) -> Result<Vec<String>, StorageError>;

    /// Rename `old_filename` to `new_filename` within the same bucket
    async fn move_file(
        &self,
        old_filename: &str,
        new_filename: &str,
        bucket: &str,
    ) -> Result<(), StorageError>;
}

/// Decode file bytes as ISO-8859-1.
///
/// Payer response files arrive in undeclared encodings, sometimes
/// encrypted, and still need to come back as a scannable string. Every
/// byte value is a valid ISO-8859-1 character, so unlike UTF-8 this
/// decoding cannot fail on any input.
pub(crate) fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// AccumulationFileHandler dispatches file operations to the configured
/// backend
pub struct AccumulationFileHandler {
    primary: Arc<dyn FileStore>,
    local: Arc<LocalStore>,
    uses_local: bool,
}

impl AccumulationFileHandler {
    /// Build a handler from settings.
    ///
    /// The local backend is used when `force_local` is set by the caller or
    /// when FORCE_LOCAL_ACCUMULATION_REPORTING is set to a truthy value in
    /// the environment; either one alone is enough. The local root is
    /// created here so an unusable path fails construction, not the first
    /// file operation.
    pub fn new(settings: &Settings, force_local: bool) -> Result<Self, StorageError> {
        std::fs::create_dir_all(&settings.storage.local_root).map_err(|e| {
            error!(
                error = %e,
                local_root = %settings.storage.local_root,
                "Failed to create local accumulation root"
            );
            StorageError::FileSystem(format!(
                "create local root '{}': {}",
                settings.storage.local_root, e
            ))
        })?;
        let local = Arc::new(LocalStore::new(&settings.storage.local_root));
        let uses_local = force_local || env_forces_local();
        let primary: Arc<dyn FileStore> = if uses_local {
            Arc::clone(&local) as Arc<dyn FileStore>
        } else {
            Arc::new(ObjectStore::new(&settings.object_store)?)
        };
        info!(
            local_backend = uses_local,
            local_root = %settings.storage.local_root,
            "Accumulation file handler initialized"
        );
        Ok(Self {
            primary,
            local,
            uses_local,
        })
    }

    /// Whether the handler routes regular traffic to the local backend
    pub fn is_local(&self) -> bool {
        self.uses_local
    }

    fn store_for(&self, filename: &str) -> &dyn FileStore {
        if filename == TEST_FIXTURE_FILENAME {
            self.local.as_ref()
        } else {
            self.primary.as_ref()
        }
    }

    #[instrument(skip(self, content), fields(filename = %filename, bucket = %bucket, size = content.len()))]
    pub async fn upload(
        &self,
        content: &str,
        filename: &str,
        bucket: &str,
    ) -> Result<(), StorageError> {
        self.store_for(filename)
            .upload(content, filename, bucket)
            .await?;
        telemetry::record_file_upload();
        Ok(())
    }

    #[instrument(skip(self), fields(filename = %filename, bucket = %bucket))]
    pub async fn download(&self, filename: &str, bucket: &str) -> Result<String, StorageError> {
        let content = self.store_for(filename).download(filename, bucket).await?;
        telemetry::record_file_download();
        Ok(content)
    }

    #[instrument(skip(self), fields(prefix = %prefix, bucket = %bucket))]
    pub async fn list_files(&self, prefix: &str, bucket: &str) -> Result<Vec<String>, StorageError> {
        self.primary.list_files(prefix, bucket).await
    }

    #[instrument(skip(self), fields(old_filename = %old_filename, new_filename = %new_filename, bucket = %bucket))]
    pub async fn move_file(
        &self,
        old_filename: &str,
        new_filename: &str,
        bucket: &str,
    ) -> Result<(), StorageError> {
        self.store_for(old_filename)
            .move_file(old_filename, new_filename, bucket)
            .await?;
        telemetry::record_file_move();
        Ok(())
    }
}

fn env_forces_local() -> bool {
    match env::var(FORCE_LOCAL_ENV) {
        Ok(value) => is_truthy(&value),
        Err(_) => false,
    }
}

/// Truthiness follows the usual flag conventions: empty and the common
/// negative spellings are off, anything else is on.
fn is_truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "no" | "off"
    )
}
