//! Filesystem abstraction and native implementation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

/// The filesystem operations parlo needs: reading config files.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Read a file's entire contents as UTF-8.
    async fn read_to_string(&self, path: &Path) -> std::io::Result<String>;

    /// Whether a path exists.
    async fn exists(&self, path: &Path) -> bool;

    /// The user's home directory.
    fn home_dir(&self) -> Option<PathBuf>;
}

/// [`tokio::fs`]-backed filesystem.
pub struct NativeFileSystem;

#[async_trait]
impl FileSystem for NativeFileSystem {
    async fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        tokio::fs::read_to_string(path).await
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    fn home_dir(&self) -> Option<PathBuf> {
        #[cfg(feature = "native")]
        {
            dirs::home_dir()
        }
        #[cfg(not(feature = "native"))]
        {
            std::env::var_os("HOME").map(PathBuf::from)
        }
    }
}
