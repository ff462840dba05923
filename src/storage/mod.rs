//! Remote blob store access
//!
//! Raw data is addressed by bucket and object name. [`GcsBlobStore`] talks to
//! Google Cloud Storage; [`LocalBlobStore`] maps buckets to directories and is
//! selected by setting `BLOB_STORE_ROOT`.

mod gcs;
mod local;

pub use gcs::GcsBlobStore;
pub use local::LocalBlobStore;

use crate::error::Result;
use std::path::Path;

/// Environment variable that switches to [`LocalBlobStore`]
pub const BLOB_STORE_ROOT_ENV: &str = "BLOB_STORE_ROOT";

pub trait BlobStore: Send + Sync {
    /// Copy `bucket/object` verbatim to `dest`, creating parent directories
    fn download(&self, bucket: &str, object: &str, dest: &Path) -> Result<()>;

    /// Backend and base location, for logs
    fn location(&self) -> String;
}

/// Store selected by the process environment
pub fn from_env() -> Box<dyn BlobStore> {
    match std::env::var_os(BLOB_STORE_ROOT_ENV) {
        Some(root) if !root.is_empty() => Box::new(LocalBlobStore::new(root)),
        _ => Box::new(GcsBlobStore::from_env()),
    }
}
