//! The local JSON catalog file.

use std::path::{Path, PathBuf};

use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, instrument};

use crate::error::ProductResult;
use crate::models::Product;

/// JSON array of products on disk.
///
/// Reads are lock-free. Writers hold [`CatalogFile::lock`] across their
/// read-modify-write so seed runs in this process do not interleave.
#[derive(Debug)]
pub struct CatalogFile {
    path: PathBuf,
    writer: Mutex<()>,
}

impl CatalogFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Exclusive write access for a read-modify-write cycle
    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.writer.lock().await
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn load(&self) -> ProductResult<Vec<Product>> {
        let bytes = tokio::fs::read(&self.path).await?;
        let products: Vec<Product> = serde_json::from_slice(&bytes)?;
        debug!(count = products.len(), "Loaded catalog");
        Ok(products)
    }

    /// Rewrite the whole catalog, replacing the file in one rename.
    #[instrument(skip(self, products), fields(path = %self.path.display(), count = products.len()))]
    pub async fn save(&self, products: &[Product]) -> ProductResult<()> {
        let json = serde_json::to_vec_pretty(products)?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductId;

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = CatalogFile::new(dir.path().join("catalog.json"));

        let products = vec![Product::new(ProductId::Int(1), "Tent", "Two person", 120.0)];
        catalog.save(&products).await.unwrap();

        assert_eq!(catalog.load().await.unwrap(), products);
        assert!(!dir.path().join("catalog.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let catalog = CatalogFile::new("/definitely/not/here.json");
        let err = catalog.load().await.unwrap_err();
        assert!(matches!(err, crate::error::ProductError::CatalogIo(_)));
    }
}
