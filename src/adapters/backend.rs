use crate::adapters::api_store::ApiStore;
use crate::adapters::file_store::FileStore;
use crate::adapters::storage::LocalStorage;
use crate::config::{CacheBackendKind, LexiconConfig};
use crate::domain::model::{CacheRecord, Stat};
use crate::domain::ports::LexiconStore;
use crate::utils::error::Result;
use crate::utils::validation::validate_required_field;
use chrono::{DateTime, Utc};
use reqwest::Client;

/// The cache store selected by `[cache].backend`.
pub enum CacheBackend {
    File(FileStore<LocalStorage>),
    Api(ApiStore),
}

impl CacheBackend {
    pub fn from_config(config: &LexiconConfig) -> Result<Self> {
        match config.cache.backend {
            CacheBackendKind::File => {
                let storage = LocalStorage::new(&config.cache.path);
                tracing::debug!("Using file cache at {}", storage.base_path().display());
                Ok(CacheBackend::File(FileStore::new(
                    storage,
                    config.cache.file_name.clone(),
                )))
            }
            CacheBackendKind::Api => {
                let endpoint = validate_required_field("cache.endpoint", &config.cache.endpoint)?;
                let client = Client::builder()
                    .timeout(config.provider.timeout())
                    .build()?;
                tracing::debug!("Using lexicon service cache at {}", endpoint);
                Ok(CacheBackend::Api(ApiStore::new(
                    client,
                    endpoint.clone(),
                    config.cache.api_key(),
                )))
            }
        }
    }

    pub fn kind(&self) -> CacheBackendKind {
        match self {
            CacheBackend::File(_) => CacheBackendKind::File,
            CacheBackend::Api(_) => CacheBackendKind::Api,
        }
    }
}

impl LexiconStore for CacheBackend {
    async fn find(&self, name: &str) -> Result<Option<CacheRecord>> {
        match self {
            CacheBackend::File(store) => store.find(name).await,
            CacheBackend::Api(store) => store.find(name).await,
        }
    }

    async fn save(&self, record: CacheRecord) -> Result<()> {
        match self {
            CacheBackend::File(store) => store.save(record).await,
            CacheBackend::Api(store) => store.save(record).await,
        }
    }

    async fn overwrite_timestamps(
        &self,
        name: &str,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        match self {
            CacheBackend::File(store) => store.overwrite_timestamps(name, created_at, updated_at).await,
            CacheBackend::Api(store) => store.overwrite_timestamps(name, created_at, updated_at).await,
        }
    }

    async fn all(&self) -> Result<Vec<CacheRecord>> {
        match self {
            CacheBackend::File(store) => store.all().await,
            CacheBackend::Api(store) => store.all().await,
        }
    }

    async fn remove(&self, name: &str) -> Result<bool> {
        match self {
            CacheBackend::File(store) => store.remove(name).await,
            CacheBackend::Api(store) => store.remove(name).await,
        }
    }

    async fn stats(&self) -> Result<Vec<Stat>> {
        match self {
            CacheBackend::File(store) => store.stats().await,
            CacheBackend::Api(store) => store.stats().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LexiconConfig;
    use tempfile::TempDir;

    #[test]
    fn test_file_backend_is_default() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = LexiconConfig::default();
        config.cache.path = temp_dir.path().to_string_lossy().to_string();

        let backend = CacheBackend::from_config(&config).unwrap();
        assert_eq!(backend.kind(), CacheBackendKind::File);
    }

    #[test]
    fn test_api_backend_requires_endpoint() {
        let mut config = LexiconConfig::default();
        config.cache.backend = CacheBackendKind::Api;
        assert!(CacheBackend::from_config(&config).is_err());

        config.cache.endpoint = Some("https://lexicon.example.com".to_string());
        let backend = CacheBackend::from_config(&config).unwrap();
        assert_eq!(backend.kind(), CacheBackendKind::Api);
    }

    #[tokio::test]
    async fn test_dispatch_reaches_file_store() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = LexiconConfig::default();
        config.cache.path = temp_dir.path().to_string_lossy().to_string();
        let backend = CacheBackend::from_config(&config).unwrap();

        let record = CacheRecord::new(
            "anchor".to_string(),
            r#"{"entries":[]}"#.to_string(),
            "dictionaryapi.com".to_string(),
            Utc::now(),
        );
        backend.save(record).await.unwrap();

        assert_eq!(backend.all().await.unwrap().len(), 1);
        assert!(backend.find("anchor").await.unwrap().is_some());
        assert_eq!(backend.stats().await.unwrap()[0].count, 1);
        assert!(backend.remove("anchor").await.unwrap());
        assert!(backend.random().await.unwrap().is_none());
    }
}
