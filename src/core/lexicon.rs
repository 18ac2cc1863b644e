use crate::core::entry::parse_response;
use crate::domain::model::{CacheRecord, LexiconDocument, Origin, Resolved};
use crate::domain::ports::{DictionaryProvider, LexiconStore};
use crate::utils::error::{LexiconError, Result};
use chrono::{DateTime, Utc};

/// Cache key for a word: trimmed and lower-cased.
pub fn cache_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn checked_key(name: &str) -> Result<String> {
    let key = cache_key(name);
    if key.is_empty() {
        return Err(LexiconError::InvalidInput {
            input: name.to_string(),
            reason: "empty word".to_string(),
        });
    }
    Ok(key)
}

/// Lookup-or-fetch over a cache store and a remote dictionary.
///
/// The store is the only record of what is already known: a cached word is never fetched again.
/// Two concurrent resolutions of the same missing word both reach the provider; the store decides
/// what the second save means.
pub struct Lexicon<S: LexiconStore, P: DictionaryProvider> {
    store: S,
    provider: P,
}

impl<S: LexiconStore, P: DictionaryProvider> Lexicon<S, P> {
    pub fn new(store: S, provider: P) -> Self {
        Self { store, provider }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn resolve(&self, name: &str) -> Result<Resolved> {
        if let Some(resolved) = self.lookup_cached(name).await? {
            return Ok(resolved);
        }
        self.fetch_and_save(name, None).await
    }

    /// The cached document for `name`, without touching the provider.
    pub async fn lookup_cached(&self, name: &str) -> Result<Option<Resolved>> {
        let key = checked_key(name)?;
        match self.store.find(&key).await? {
            Some(record) => {
                tracing::debug!("Cache hit for {:?}", key);
                Ok(Some(cached(record)?))
            }
            None => Ok(None),
        }
    }

    /// Fetches `name` from the provider and saves it. Both timestamps are `created_at` when
    /// given, the current time otherwise.
    pub async fn fetch_and_save(
        &self,
        name: &str,
        created_at: Option<DateTime<Utc>>,
    ) -> Result<Resolved> {
        let key = checked_key(name)?;
        tracing::info!("📡 {:?} not cached, fetching from {}", key, self.provider.source_name());

        let body = self.provider.fetch(&key).await?;
        let document = parse_response(&key, &body)?;
        let definition = serde_json::to_string(&document)?;

        let record = CacheRecord::new(
            key,
            definition,
            self.provider.source_name().to_string(),
            created_at.unwrap_or_else(Utc::now),
        );
        self.store.save(record.clone()).await?;
        tracing::info!(
            "💾 Saved {:?} ({} entries)",
            record.name,
            document.entries.len()
        );

        Ok(Resolved {
            document,
            record,
            origin: Origin::Fetched,
        })
    }

    pub async fn exists(&self, name: &str) -> Result<bool> {
        self.store.exists(&checked_key(name)?).await
    }

    /// Drops `name` from the cache; the next lookup fetches it again.
    pub async fn remove(&self, name: &str) -> Result<bool> {
        let key = checked_key(name)?;
        let removed = self.store.remove(&key).await?;
        if removed {
            tracing::info!("🗑️ Removed {:?}", key);
        }
        Ok(removed)
    }

    /// A random cached word with its document.
    pub async fn random(&self) -> Result<Option<Resolved>> {
        self.store.random().await?.map(cached).transpose()
    }
}

fn cached(record: CacheRecord) -> Result<Resolved> {
    let document = decode_document(&record)?;
    Ok(Resolved {
        document,
        record,
        origin: Origin::Cached,
    })
}

/// Deserializes a cached document. Failure means the store holds corrupt data.
pub fn decode_document(record: &CacheRecord) -> Result<LexiconDocument> {
    serde_json::from_str(&record.definition).map_err(|e| LexiconError::CacheCorrupt {
        name: record.name.clone(),
        message: e.to_string(),
    })
}
