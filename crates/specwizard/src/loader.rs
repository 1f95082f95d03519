//! Asynchronous dataset loading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::{Error, Result};

/// Loads the product dataset file into a [`Catalog`].
///
/// A dataset that is missing when loading starts gets one more chance after
/// `retry_delay`, which covers a file still being written by a deploy.
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    path: PathBuf,
    retry_delay: Duration,
}

impl DatasetLoader {
    /// Create a loader for `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, retry_delay: Duration) -> Self {
        Self {
            path: path.into(),
            retry_delay,
        }
    }

    /// Create a loader from the `[dataset]` configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.dataset_path(), config.retry_delay())
    }

    /// Get the dataset path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the dataset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DatasetUnavailable`] if the file is still missing
    /// after the re-attempt, or an error if it cannot be read or opened.
    pub async fn load(&self) -> Result<Catalog> {
        if !self.exists().await {
            debug!(
                delay = ?self.retry_delay,
                "Dataset missing at {}, retrying once",
                self.path.display()
            );
            tokio::time::sleep(self.retry_delay).await;

            if !self.exists().await {
                warn!("Dataset still missing at {}", self.path.display());
                return Err(Error::DatasetUnavailable {
                    path: self.path.clone(),
                });
            }
        }

        let bytes = tokio::fs::read(&self.path).await?;
        let fingerprint = blake3::hash(&bytes).to_hex().to_string();
        debug!(bytes = bytes.len(), %fingerprint, "Read dataset");

        // fingerprint and catalog come from the same bytes
        let path = self.path.clone();
        let catalog = tokio::task::spawn_blocking(move || Catalog::from_bytes(path, &bytes))
            .await
            .map_err(|e| Error::internal(format!("dataset open task failed: {e}")))??;

        info!(%fingerprint, "Loaded dataset from {}", self.path.display());
        Ok(catalog.with_fingerprint(fingerprint))
    }

    async fn exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogBuilder;
    use crate::product::{Product, SpecEntry};

    fn write_dataset(path: &Path) {
        let builder = CatalogBuilder::create(path).unwrap();
        builder
            .insert_product(&Product::new("p1", "Fenix 8", "https://example.com/fenix8", Some(9999.0)))
            .unwrap();
        builder
            .insert_spec(&SpecEntry::new("p1", "Display", "displayType", "amoled"))
            .unwrap();
        builder.finish().unwrap();
    }

    #[tokio::test]
    async fn test_load_existing_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.db");
        write_dataset(&path);

        let loader = DatasetLoader::new(&path, Duration::from_millis(1));
        let catalog = loader.load().await.unwrap();

        assert_eq!(catalog.path(), path.as_path());
        let fingerprint = catalog.fingerprint().unwrap();
        assert_eq!(fingerprint.len(), 64);
        assert_eq!(
            fingerprint,
            blake3::hash(&std::fs::read(&path).unwrap()).to_hex().as_str()
        );
    }

    #[tokio::test]
    async fn test_missing_dataset_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let loader = DatasetLoader::new(dir.path().join("missing.db"), Duration::from_millis(1));

        let err = loader.load().await.unwrap_err();
        assert!(matches!(err, Error::DatasetUnavailable { .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_dataset_appearing_during_retry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.db");
        let loader = DatasetLoader::new(&path, Duration::from_millis(200));

        // written elsewhere and renamed into place, so the loader never sees a partial file
        let staging = dir.path().join("staging.db");
        let target = path.clone();
        let writer = tokio::task::spawn_blocking(move || {
            std::thread::sleep(Duration::from_millis(20));
            write_dataset(&staging);
            std::fs::rename(&staging, &target).unwrap();
        });

        let catalog = loader.load().await.unwrap();
        writer.await.unwrap();
        assert_eq!(catalog.stats().unwrap().products, 1);
    }

    #[tokio::test]
    async fn test_fingerprint_matches_queried_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.db");
        write_dataset(&path);

        let loader = DatasetLoader::new(&path, Duration::from_millis(1));
        let catalog = loader.load().await.unwrap();
        let fingerprint = catalog.fingerprint().unwrap().to_string();

        // a later deploy does not change what the loaded catalog sees
        std::fs::remove_file(&path).unwrap();
        let builder = CatalogBuilder::create(&path).unwrap();
        builder
            .insert_product(&Product::new("p9", "Venu 3", "https://example.com/venu3", None))
            .unwrap();
        builder.finish().unwrap();

        let products = catalog.products_with_spec("displayType", "amoled").unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].product_id, "p1");
        assert_ne!(
            fingerprint,
            blake3::hash(&std::fs::read(&path).unwrap()).to_hex().as_str()
        );
    }

    #[tokio::test]
    async fn test_not_a_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.db");
        std::fs::write(&path, "this is not sqlite").unwrap();

        let loader = DatasetLoader::new(&path, Duration::from_millis(1));
        assert!(loader.load().await.is_err());
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.dataset.path = Some(PathBuf::from("/srv/garmin/products.db"));
        config.dataset.retry_delay_ms = 250;

        let loader = DatasetLoader::from_config(&config);
        assert_eq!(loader.path(), Path::new("/srv/garmin/products.db"));
        assert_eq!(loader.retry_delay, Duration::from_millis(250));
    }
}
