use crate::domain::model::{CacheRecord, Stat};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

/// Raw byte storage keyed by relative path.
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(&self, path: &str, data: &[u8]) -> impl Future<Output = Result<()>> + Send;
}

/// Persistence for resolved lookups, keyed by the case-folded word.
///
/// Implementations hand out owned copies; nothing returned aliases store internals.
pub trait LexiconStore: Send + Sync {
    fn find(&self, name: &str) -> impl Future<Output = Result<Option<CacheRecord>>> + Send;

    /// Persists `record` with the timestamps it carries. Saving a name that is already stored keeps
    /// the stored `created_at`.
    fn save(&self, record: CacheRecord) -> impl Future<Output = Result<()>> + Send;

    fn overwrite_timestamps(
        &self,
        name: &str,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<()>> + Send;

    fn all(&self) -> impl Future<Output = Result<Vec<CacheRecord>>> + Send;

    /// Deletes `name`. Returns whether a record was there.
    fn remove(&self, name: &str) -> impl Future<Output = Result<bool>> + Send;

    fn exists(&self, name: &str) -> impl Future<Output = Result<bool>> + Send {
        async move { Ok(self.find(name).await?.is_some()) }
    }

    /// A uniformly chosen cached record, `None` when the store is empty.
    fn random(&self) -> impl Future<Output = Result<Option<CacheRecord>>> + Send {
        async move {
            let records = self.all().await?;
            Ok(records.choose(&mut rand::thread_rng()).cloned())
        }
    }

    /// Words added per month, oldest month first.
    fn stats(&self) -> impl Future<Output = Result<Vec<Stat>>> + Send {
        async move {
            let mut months: BTreeMap<String, u64> = BTreeMap::new();
            for record in self.all().await? {
                *months
                    .entry(record.created_at.format("%Y-%m").to_string())
                    .or_default() += 1;
            }
            Ok(months
                .into_iter()
                .map(|(label, count)| Stat { label, count })
                .collect())
        }
    }
}

/// Transport to the remote dictionary. Returns the raw response body of a successful lookup.
#[async_trait]
pub trait DictionaryProvider: Send + Sync {
    async fn fetch(&self, word: &str) -> Result<Vec<u8>>;

    /// Provenance recorded on cache records produced from this provider.
    fn source_name(&self) -> &str;
}

pub trait ConfigProvider: Send + Sync {
    fn provider_endpoint(&self) -> &str;
    fn api_key(&self) -> Option<&str>;
    fn request_timeout(&self) -> Duration;
    fn throttle_window(&self) -> (Duration, Duration);
}
