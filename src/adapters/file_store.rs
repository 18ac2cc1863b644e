use crate::domain::model::CacheRecord;
use crate::domain::ports::{LexiconStore, Storage};
use crate::utils::error::{LexiconError, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::{Mutex, MutexGuard};

pub const DEFAULT_FILE_NAME: &str = "lexicon.json";

type Records = BTreeMap<String, CacheRecord>;

/// Cache store keeping every record in one JSON array file.
///
/// Each record serializes to the `name, definition, source, createdAt, updatedAt` columns with
/// epoch-millisecond timestamps, ordered by name. The file is read once, on first use, and kept in
/// memory afterwards; every write rewrites the whole file through [`Storage::write_file`]. The
/// store assumes it is the only writer of its file while it is open.
pub struct FileStore<S: Storage> {
    storage: S,
    file_name: String,
    // None until the file has been read
    records: Mutex<Option<Records>>,
}

impl<S: Storage> FileStore<S> {
    pub fn new(storage: S, file_name: impl Into<String>) -> Self {
        Self {
            storage,
            file_name: file_name.into(),
            records: Mutex::new(None),
        }
    }

    /// Locks the in-memory records, reading the file the first time.
    async fn records(&self) -> Result<MutexGuard<'_, Option<Records>>> {
        let mut guard = self.records.lock().await;
        if guard.is_none() {
            let loaded = self.load().await?;
            tracing::debug!("Loaded {} cached records from {}", loaded.len(), self.file_name);
            *guard = Some(loaded);
        }
        Ok(guard)
    }

    async fn load(&self) -> Result<Records> {
        let data = match self.storage.read_file(&self.file_name).await {
            Ok(data) => data,
            Err(LexiconError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Cache file {} does not exist yet", self.file_name);
                return Ok(Records::new());
            }
            Err(e) => return Err(e),
        };

        let rows: Vec<CacheRecord> =
            serde_json::from_slice(&data).map_err(|e| LexiconError::CacheCorrupt {
                name: self.file_name.clone(),
                message: e.to_string(),
            })?;
        Ok(rows.into_iter().map(|r| (r.name.clone(), r)).collect())
    }

    async fn persist(&self, records: &Records, name: &str) -> Result<()> {
        let rows: Vec<&CacheRecord> = records.values().collect();
        let json = serde_json::to_vec_pretty(&rows)?;
        tracing::debug!("Writing {} records ({} bytes) to {}", rows.len(), json.len(), self.file_name);

        self.storage
            .write_file(&self.file_name, &json)
            .await
            .map_err(|e| LexiconError::CacheWriteFailure {
                name: name.to_string(),
                message: e.to_string(),
            })
    }

    /// Applies `change` to a copy of the records and keeps it only once the file is written.
    async fn update<T>(&self, name: &str, change: impl FnOnce(&mut Records) -> Result<T>) -> Result<T> {
        let mut guard = self.records().await?;
        let mut next = guard.clone().unwrap_or_default();
        let outcome = change(&mut next)?;
        self.persist(&next, name).await?;
        *guard = Some(next);
        Ok(outcome)
    }
}

impl<S: Storage> LexiconStore for FileStore<S> {
    async fn find(&self, name: &str) -> Result<Option<CacheRecord>> {
        let guard = self.records().await?;
        Ok(guard.as_ref().and_then(|records| records.get(name)).cloned())
    }

    async fn save(&self, mut record: CacheRecord) -> Result<()> {
        let name = record.name.clone();
        self.update(&name, |records| {
            if let Some(existing) = records.get(&record.name) {
                // 已存在：保留原本的 createdAt
                tracing::debug!("{} already cached, replacing its document", record.name);
                record.created_at = existing.created_at;
            }
            records.insert(record.name.clone(), record);
            Ok(())
        })
        .await
    }

    async fn overwrite_timestamps(
        &self,
        name: &str,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        self.update(name, |records| {
            let existing = records.get_mut(name).ok_or_else(|| LexiconError::CacheWriteFailure {
                name: name.to_string(),
                message: "no cached record to update".to_string(),
            })?;
            existing.created_at = created_at;
            existing.updated_at = updated_at;
            Ok(())
        })
        .await
    }

    async fn all(&self) -> Result<Vec<CacheRecord>> {
        let guard = self.records().await?;
        Ok(guard
            .as_ref()
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn remove(&self, name: &str) -> Result<bool> {
        if !self.exists(name).await? {
            return Ok(false);
        }
        self.update(name, |records| Ok(records.remove(name).is_some()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::LocalStorage;
    use crate::domain::model::Stat;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn record(name: &str, at: DateTime<Utc>) -> CacheRecord {
        CacheRecord::new(
            name.to_string(),
            r#"{"entries":[]}"#.to_string(),
            "dictionaryapi.com".to_string(),
            at,
        )
    }

    fn store(dir: &TempDir) -> FileStore<LocalStorage> {
        FileStore::new(LocalStorage::new(dir.path()), DEFAULT_FILE_NAME)
    }

    #[tokio::test]
    async fn test_find_on_missing_file_is_a_miss() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        assert!(store.find("anchor").await.unwrap().is_none());
        assert!(store.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_and_find() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        let created = Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap();

        store.save(record("anchor", created)).await.unwrap();

        let found = store.find("anchor").await.unwrap().unwrap();
        assert_eq!(found.created_at, created);
        assert_eq!(found.updated_at, created);
        assert_eq!(found.source, "dictionaryapi.com");
        assert!(store.find("Anchor").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_persisted_columns() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        let created = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();

        store.save(record("anchor", created)).await.unwrap();
        store.overwrite_timestamps("anchor", created, created).await.unwrap();

        let raw = std::fs::read_to_string(temp_dir.path().join(DEFAULT_FILE_NAME)).unwrap();
        let rows: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(rows[0]["name"], "anchor");
        assert_eq!(rows[0]["definition"], r#"{"entries":[]}"#);
        assert_eq!(rows[0]["createdAt"], 1_577_836_800_000i64);
        assert_eq!(rows[0]["updatedAt"], 1_577_836_800_000i64);
    }

    #[tokio::test]
    async fn test_duplicate_save_keeps_created_at() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        let first = Utc.with_ymd_and_hms(2019, 6, 1, 12, 0, 0).unwrap();

        store.save(record("anchor", first)).await.unwrap();
        let refetched = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut second = record("anchor", refetched);
        second.definition = r#"{"entries":[{"meta":{"id":"anchor:1"}}]}"#.to_string();
        store.save(second).await.unwrap();

        let all = store.all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].created_at, first);
        assert_eq!(all[0].updated_at, refetched);
        assert!(all[0].definition.contains("anchor:1"));
    }

    #[tokio::test]
    async fn test_overwrite_timestamps_of_unknown_name_fails() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        let at = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();

        let err = store.overwrite_timestamps("ghost", at, at).await.unwrap_err();
        assert!(matches!(err, LexiconError::CacheWriteFailure { .. }));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_surfaced() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(DEFAULT_FILE_NAME), b"{not json").unwrap();
        let store = store(&temp_dir);

        let err = store.find("anchor").await.unwrap_err();
        assert!(matches!(err, LexiconError::CacheCorrupt { .. }));
    }

    #[tokio::test]
    async fn test_file_is_read_once() {
        let temp_dir = TempDir::new().unwrap();
        let at = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let first = store(&temp_dir);
        first.save(record("anchor", at)).await.unwrap();

        let second = store(&temp_dir);
        assert!(second.find("anchor").await.unwrap().is_some());

        // 載入後不再讀檔
        std::fs::write(temp_dir.path().join(DEFAULT_FILE_NAME), b"{not json").unwrap();
        assert!(second.find("anchor").await.unwrap().is_some());
        assert!(second.find("ankh").await.unwrap().is_none());
        assert_eq!(second.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_records_are_persisted_in_name_order() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        let at = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();

        for name in ["dog", "anchor", "cat"] {
            store.save(record(name, at)).await.unwrap();
        }

        let raw = std::fs::read_to_string(temp_dir.path().join(DEFAULT_FILE_NAME)).unwrap();
        let rows: Vec<CacheRecord> = serde_json::from_str(&raw).unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["anchor", "cat", "dog"]);
    }

    #[tokio::test]
    async fn test_remove() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        store.save(record("anchor", Utc::now())).await.unwrap();
        store.save(record("ankh", Utc::now())).await.unwrap();

        assert!(store.remove("anchor").await.unwrap());
        assert!(!store.remove("anchor").await.unwrap());
        assert!(!store.exists("anchor").await.unwrap());
        assert!(store.exists("ankh").await.unwrap());

        let reopened = FileStore::new(LocalStorage::new(temp_dir.path()), DEFAULT_FILE_NAME);
        let names: Vec<String> = reopened.all().await.unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["ankh"]);
    }

    #[tokio::test]
    async fn test_stats_count_words_per_month() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        store.save(record("anchor", Utc.with_ymd_and_hms(2020, 1, 5, 0, 0, 0).unwrap())).await.unwrap();
        store.save(record("ankh", Utc.with_ymd_and_hms(2020, 1, 20, 0, 0, 0).unwrap())).await.unwrap();
        store.save(record("cat", Utc.with_ymd_and_hms(2019, 12, 31, 0, 0, 0).unwrap())).await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(
            stats,
            vec![
                Stat { label: "2019-12".to_string(), count: 1 },
                Stat { label: "2020-01".to_string(), count: 2 },
            ]
        );
    }

    #[tokio::test]
    async fn test_random_picks_a_cached_record() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        assert!(store.random().await.unwrap().is_none());

        store.save(record("anchor", Utc::now())).await.unwrap();
        store.save(record("ankh", Utc::now())).await.unwrap();

        for _ in 0..10 {
            let picked = store.random().await.unwrap().unwrap();
            assert!(picked.name == "anchor" || picked.name == "ankh");
        }
    }
}
