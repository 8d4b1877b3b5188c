use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::core::config::Settings;

const STAGING_PREFIX: &str = ".upload-";
const STAGING_SUFFIX: &str = ".part";

#[derive(Debug, Error)]
pub(crate) enum StorageError {
    #[error("upload exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },
    #[error("upload storage failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Local directory holding submitted files as `<submission id><ext>`.
#[derive(Debug, Clone)]
pub(crate) struct UploadStorage {
    root: PathBuf,
    max_bytes: u64,
}

impl UploadStorage {
    pub(crate) async fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let storage = settings.storage();
        fs::create_dir_all(&storage.upload_dir).await?;
        Ok(Self::new(storage.upload_dir.clone(), storage.max_upload_size_mb * 1024 * 1024))
    }

    pub(crate) fn new(root: PathBuf, max_bytes: u64) -> Self {
        Self { root, max_bytes }
    }

    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Opens a uniquely named partial file next to the final location so the
    /// later rename never crosses filesystems. The file is deleted on drop
    /// unless it is committed.
    pub(crate) async fn begin_staging(&self, original_name: &str) -> Result<StagingFile, StorageError> {
        let root = self.root.clone();
        let part = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix(STAGING_PREFIX)
                .suffix(STAGING_SUFFIX)
                .tempfile_in(root)
        })
        .await
        .map_err(std::io::Error::other)??;
        let file = fs::File::from_std(part.reopen()?);

        Ok(StagingFile {
            file,
            part,
            original_name: original_name.to_string(),
            written: 0,
            limit: self.max_bytes,
        })
    }

    /// Moves a finished upload to its permanent name and returns the new path.
    pub(crate) async fn commit(
        &self,
        upload: StagedUpload,
        stored_name: &str,
    ) -> Result<PathBuf, StorageError> {
        let target = self.root.join(stored_name);
        let StagedUpload { part, .. } = upload;

        let destination = target.clone();
        tokio::task::spawn_blocking(move || part.persist(destination))
            .await
            .map_err(std::io::Error::other)?
            .map_err(|err| err.error)?;

        Ok(target)
    }

    pub(crate) async fn remove(&self, stored_name: &str) -> Result<(), StorageError> {
        fs::remove_file(self.root.join(stored_name)).await?;
        Ok(())
    }
}

#[derive(Debug)]
pub(crate) struct StagingFile {
    file: fs::File,
    part: NamedTempFile,
    original_name: String,
    written: u64,
    limit: u64,
}

impl StagingFile {
    pub(crate) async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StorageError> {
        let next = self.written + chunk.len() as u64;
        if next > self.limit {
            return Err(StorageError::TooLarge { limit: self.limit });
        }
        self.file.write_all(chunk).await?;
        self.written = next;
        Ok(())
    }

    pub(crate) async fn finish(mut self) -> Result<StagedUpload, StorageError> {
        self.file.flush().await?;
        self.file.sync_all().await?;

        let StagingFile { file, part, original_name, written, .. } = self;
        drop(file);

        Ok(StagedUpload { part, original_name, size: written })
    }
}

/// A fully received upload waiting for its permanent name.
#[derive(Debug)]
pub(crate) struct StagedUpload {
    part: NamedTempFile,
    pub(crate) original_name: String,
    pub(crate) size: u64,
}

#[cfg(test)]
impl StagedUpload {
    pub(crate) fn staging_path(&self) -> &Path {
        self.part.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage(dir: &tempfile::TempDir, max_bytes: u64) -> UploadStorage {
        UploadStorage::new(dir.path().to_path_buf(), max_bytes)
    }

    #[tokio::test]
    async fn committed_upload_is_renamed_and_staging_is_gone() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = storage(&dir, 1024);

        let mut staging = storage.begin_staging("report.pdf").await.expect("staging");
        staging.write_chunk(b"%PDF-1.4 ").await.expect("chunk");
        staging.write_chunk(b"body").await.expect("chunk");
        let staged = staging.finish().await.expect("finish");
        let staging_path = staged.staging_path().to_path_buf();
        assert_eq!(staged.size, 13);
        assert_eq!(staged.original_name, "report.pdf");

        let stored = storage.commit(staged, "abc.pdf").await.expect("commit");

        assert_eq!(stored, dir.path().join("abc.pdf"));
        assert_eq!(std::fs::read(&stored).unwrap(), b"%PDF-1.4 body");
        assert!(!staging_path.exists());
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected_and_cleaned_up() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = storage(&dir, 4);

        let mut staging = storage.begin_staging("big.bin").await.expect("staging");
        let err = staging.write_chunk(b"12345").await.unwrap_err();
        assert!(matches!(err, StorageError::TooLarge { limit: 4 }));
        drop(staging);

        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn abandoned_staged_upload_is_removed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = storage(&dir, 1024);

        let mut staging = storage.begin_staging("notes.txt").await.expect("staging");
        staging.write_chunk(b"hello").await.expect("chunk");
        let staged = staging.finish().await.expect("finish");
        let path = staged.staging_path().to_path_buf();
        assert!(path.exists());

        drop(staged);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn staging_file_lives_in_upload_root_until_committed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = storage(&dir, 1024);

        let staging = storage.begin_staging("draft.docx").await.expect("staging");
        let staged = staging.finish().await.expect("finish");
        let path = staged.staging_path().to_path_buf();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();

        assert_eq!(path.parent(), Some(dir.path()));
        assert!(name.starts_with(".upload-") && name.ends_with(".part"), "staging name {name}");
        assert_eq!(staged.size, 0);

        storage.commit(staged, "final.docx").await.expect("commit");
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["final.docx".to_string()]);
    }

    #[tokio::test]
    async fn remove_deletes_stored_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = storage(&dir, 1024);
        std::fs::write(dir.path().join("x.txt"), b"x").unwrap();

        storage.remove("x.txt").await.expect("remove");
        assert!(!dir.path().join("x.txt").exists());
        assert!(storage.remove("x.txt").await.is_err());
    }
}
