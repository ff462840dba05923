use super::BlobStore;
use crate::error::{PipelineError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Blob store backed by a directory: `<root>/<bucket>/<object>`
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn object_path(&self, bucket: &str, object: &str) -> PathBuf {
        self.root.join(bucket).join(object)
    }
}

impl BlobStore for LocalBlobStore {
    fn download(&self, bucket: &str, object: &str, dest: &Path) -> Result<()> {
        let source = self.object_path(bucket, object);
        if !source.is_file() {
            return Err(PipelineError::FetchError(format!(
                "object {}/{} not found under {}",
                bucket,
                object,
                self.root.display()
            )));
        }
        let fetch_io = |e: std::io::Error| PipelineError::FetchError(format!("{}: {}", dest.display(), e));
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(fetch_io)?;
        }
        fs::copy(&source, dest).map_err(fetch_io)?;
        info!(source = %source.display(), dest = %dest.display(), "Object copied");
        Ok(())
    }

    fn location(&self) -> String {
        format!("local:{}", self.root.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_download_copies_verbatim() {
        let tmp = TempDir::new().unwrap();
        let store = LocalBlobStore::new(tmp.path().join("blobs"));
        let source = store.object_path("b", "raw.csv");
        fs::create_dir_all(source.parent().unwrap()).unwrap();
        fs::write(&source, "x,booking_status\n1,0\n").unwrap();

        let dest = tmp.path().join("artifacts/raw/raw.csv");
        store.download("b", "raw.csv", &dest).unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), "x,booking_status\n1,0\n");
    }

    #[test]
    fn test_missing_object_is_fetch_error() {
        let tmp = TempDir::new().unwrap();
        let store = LocalBlobStore::new(tmp.path());
        let err = store.download("b", "nope.csv", &tmp.path().join("out.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::FetchError(_)));
    }
}
