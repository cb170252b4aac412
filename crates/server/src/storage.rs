// crates/server/src/storage.rs
//! On-disk storage for uploaded files.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Name used when the client sends no usable filename.
const FALLBACK_NAME: &str = "upload.csv";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Cannot create upload directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write upload {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Writes uploads into one directory as `<job id>-<file name>`.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StorageError::CreateDir {
                path: self.dir.clone(),
                source,
            })
    }

    /// Persist `contents` for job `id` and return the stored path.
    pub async fn save(
        &self,
        id: &str,
        filename: Option<&str>,
        contents: &[u8],
    ) -> Result<PathBuf, StorageError> {
        self.ensure_dir().await?;
        let path = self.dir.join(stored_name(id, filename));
        tokio::fs::write(&path, contents)
            .await
            .map_err(|source| StorageError::Write {
                path: path.clone(),
                source,
            })?;
        tracing::debug!(path = %path.display(), bytes = contents.len(), "stored upload");
        Ok(path)
    }
}

/// Keep only the final path component of a client-supplied name.
fn stored_name(id: &str, filename: Option<&str>) -> String {
    let base = filename
        .and_then(|name| name.rsplit(['/', '\\']).next())
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .unwrap_or(FALLBACK_NAME);
    format!("{id}-{base}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_name_strips_directories() {
        assert_eq!(stored_name("42", Some("data.csv")), "42-data.csv");
        assert_eq!(stored_name("42", Some("../../etc/passwd")), "42-passwd");
        assert_eq!(stored_name("42", Some(r"C:\Users\me\data.csv")), "42-data.csv");
    }

    #[test]
    fn test_stored_name_fallback() {
        assert_eq!(stored_name("42", None), "42-upload.csv");
        assert_eq!(stored_name("42", Some("")), "42-upload.csv");
        assert_eq!(stored_name("42", Some("dir/")), "42-upload.csv");
        assert_eq!(stored_name("42", Some("..")), "42-upload.csv");
    }

    #[tokio::test]
    async fn test_save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = UploadStore::new(dir.path().join("nested"));

        let path = store.save("abc", Some("test.csv"), b"1,x\n").await.unwrap();
        assert_eq!(path, dir.path().join("nested").join("abc-test.csv"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"1,x\n");
    }

    #[tokio::test]
    async fn test_save_fails_when_dir_is_a_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let store = UploadStore::new(file.path());

        let err = store.save("abc", Some("test.csv"), b"1,x\n").await.unwrap_err();
        assert!(matches!(err, StorageError::CreateDir { .. }));
    }
}
