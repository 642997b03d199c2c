// Local-directory backend for accumulation files
//
// Mirrors the object-store layout under a fixed root directory. Used for
// development and for environments where FORCE_LOCAL_ACCUMULATION_REPORTING
// is set; the per-call bucket name is accepted and ignored so call sites
// stay identical across backends.

use crate::errors::StorageError;
use crate::storage::handler::{decode_latin1, FileStore};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, instrument};

/// LocalStore persists accumulation files under a root directory
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn file_path(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    async fn ensure_parent_dirs(&self, path: &Path, filename: &str) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                error!(error = %e, filename = %filename, "Failed to create directories for accumulation file");
                StorageError::FileSystem(format!("create directories for '{}': {}", filename, e))
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl FileStore for LocalStore {
    #[instrument(skip(self, content), fields(filename = %filename, size = content.len()))]
    async fn upload(
        &self,
        content: &str,
        filename: &str,
        _bucket: &str,
    ) -> Result<(), StorageError> {
        let path = self.file_path(filename);
        self.ensure_parent_dirs(&path, filename).await?;
        fs::write(&path, content.as_bytes()).await.map_err(|e| {
            error!(error = %e, filename = %filename, "Failed to write accumulation file");
            StorageError::FileSystem(format!("write '{}': {}", filename, e))
        })?;
        debug!(filename = %filename, "Accumulation file written");
        Ok(())
    }

    #[instrument(skip(self), fields(filename = %filename))]
    async fn download(&self, filename: &str, _bucket: &str) -> Result<String, StorageError> {
        let path = self.file_path(filename);
        let bytes = fs::read(&path).await.map_err(|e| {
            error!(error = %e, filename = %filename, "Failed to read accumulation file");
            StorageError::FileSystem(format!("read '{}': {}", filename, e))
        })?;
        Ok(decode_latin1(&bytes))
    }

    #[instrument(skip(self), fields(prefix = %prefix))]
    async fn list_files(&self, prefix: &str, _bucket: &str) -> Result<Vec<String>, StorageError> {
        let prefix = prefix.trim_end_matches('/');
        let dir = self.root.join(prefix);

        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            // A prefix nothing has been written under lists as empty.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                error!(error = %e, prefix = %prefix, "Failed to list accumulation files");
                return Err(StorageError::FileSystem(format!(
                    "list '{}': {}",
                    prefix, e
                )));
            }
        };

        let mut files = Vec::new();
        loop {
            let entry = entries.next_entry().await.map_err(|e| {
                error!(error = %e, prefix = %prefix, "Failed to read directory entry");
                StorageError::FileSystem(format!("list '{}': {}", prefix, e))
            })?;
            let Some(entry) = entry else { break };

            let file_type = entry.file_type().await.map_err(|e| {
                error!(error = %e, prefix = %prefix, "Failed to inspect directory entry");
                StorageError::FileSystem(format!("list '{}': {}", prefix, e))
            })?;
            // Subdirectories are deeper prefixes, not files under this one.
            if !file_type.is_file() {
                continue;
            }
            if let Ok(name) = entry.file_name().into_string() {
                files.push(format!("{}/{}", prefix, name));
            }
        }
        Ok(files)
    }

    #[instrument(skip(self), fields(old_filename = %old_filename, new_filename = %new_filename))]
    async fn move_file(
        &self,
        old_filename: &str,
        new_filename: &str,
        _bucket: &str,
    ) -> Result<(), StorageError> {
        let old_path = self.file_path(old_filename);
        let new_path = self.file_path(new_filename);
        self.ensure_parent_dirs(&new_path, new_filename).await?;
        fs::rename(&old_path, &new_path).await.map_err(|e| {
            error!(
                error = %e,
                old_filename = %old_filename,
                new_filename = %new_filename,
                "Failed to move accumulation file"
            );
            StorageError::FileSystem(format!(
                "move '{}' to '{}': {}",
                old_filename, new_filename, e
            ))
        })?;
        debug!(
            old_filename = %old_filename,
            new_filename = %new_filename,
            "Accumulation file moved"
        );
        Ok(())
    }
}
