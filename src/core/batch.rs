use crate::core::lexicon::Lexicon;
use crate::domain::model::ImportReport;
use crate::domain::ports::{DictionaryProvider, LexiconStore};
use crate::utils::error::{LexiconError, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use rand::Rng;
use std::time::Duration;

pub const BATCH_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One word to import, optionally backdated to when it was first looked up elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItem {
    pub name: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl BatchItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timestamp: None,
        }
    }

    pub fn with_timestamp(name: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            timestamp: Some(timestamp),
        }
    }
}

/// A batch input line and what it parsed into. `raw` is kept for the failure report.
#[derive(Debug)]
pub struct BatchLine {
    pub raw: String,
    pub item: Result<BatchItem>,
}

/// Parses `word` / `word,YYYY-MM-DD HH:MM:SS` lines. Blank lines and `#` comments are skipped;
/// quotes have no special meaning.
pub fn parse_batch(input: &str) -> Vec<BatchLine> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(input.as_bytes());

    let mut lines = Vec::new();
    for result in reader.records() {
        let line = match result {
            Ok(record) if record.iter().all(str::is_empty) => continue,
            Ok(record) => {
                let raw = record
                    .position()
                    .and_then(|p| raw_line(input, p.byte()))
                    .map(str::to_string)
                    .unwrap_or_else(|| record.iter().collect::<Vec<_>>().join(","));
                let item = parse_record(&record, &raw);
                BatchLine { raw, item }
            }
            Err(e) => BatchLine {
                raw: e
                    .position()
                    .and_then(|p| raw_line(input, p.byte()))
                    .unwrap_or("unknown line")
                    .to_string(),
                item: Err(LexiconError::InvalidInput {
                    input: String::new(),
                    reason: e.to_string(),
                }),
            },
        };
        lines.push(line);
    }
    lines
}

/// The input line of the record starting at byte `offset`, as written. The reader reports the
/// offset before the blank and comment lines it skipped.
fn raw_line(input: &str, offset: u64) -> Option<&str> {
    let start = usize::try_from(offset).ok()?;
    input
        .get(start..)?
        .lines()
        .find(|line| !line.is_empty() && !line.starts_with('#'))
}

fn parse_record(record: &csv::StringRecord, raw: &str) -> Result<BatchItem> {
    let invalid = |reason: String| LexiconError::InvalidInput {
        input: raw.to_string(),
        reason,
    };

    match record.len() {
        1 if !record[0].is_empty() => Ok(BatchItem::new(&record[0])),
        2 if !record[0].is_empty() => {
            let timestamp = NaiveDateTime::parse_from_str(&record[1], BATCH_TIMESTAMP_FORMAT)
                .map_err(|e| invalid(format!("bad timestamp {:?}: {}", &record[1], e)))?
                .and_utc();
            Ok(BatchItem::with_timestamp(&record[0], timestamp))
        }
        n => Err(invalid(format!("expected a word and an optional timestamp, got {} fields", n))),
    }
}

/// Resolves words one after another, pausing after each call to the provider.
///
/// The pause is drawn uniformly from the configured window and follows every word that was not
/// cached, including the ones the provider could not define; re-importing a known list never
/// waits. A timestamped word that has to be fetched is saved with that timestamp; a cached one has
/// its timestamps overwritten. Per-word failures are recorded in the report and never stop the
/// run.
pub struct BatchImporter<'a, S: LexiconStore, P: DictionaryProvider> {
    lexicon: &'a Lexicon<S, P>,
    min_delay: Duration,
    max_delay: Duration,
}

impl<'a, S: LexiconStore, P: DictionaryProvider> BatchImporter<'a, S, P> {
    pub fn new(lexicon: &'a Lexicon<S, P>, throttle_window: (Duration, Duration)) -> Self {
        let (min_delay, max_delay) = throttle_window;
        Self {
            lexicon,
            min_delay,
            max_delay: max_delay.max(min_delay),
        }
    }

    /// Imports every parsed line of `input`; unparseable lines count as failures.
    pub async fn import_text(&self, input: &str) -> ImportReport {
        let mut report = ImportReport::default();
        for line in parse_batch(input) {
            match line.item {
                Ok(item) => self.import_one(&item, &line.raw, &mut report).await,
                Err(e) => {
                    tracing::error!("❌ Skipping {:?}: {}", line.raw, e);
                    report.failed.push(line.raw);
                }
            }
        }
        log_summary(&report);
        report
    }

    pub async fn import_all(&self, items: &[BatchItem]) -> ImportReport {
        let mut report = ImportReport::default();
        for item in items {
            self.import_one(item, &item.name, &mut report).await;
        }
        log_summary(&report);
        report
    }

    async fn import_one(&self, item: &BatchItem, label: &str, report: &mut ImportReport) {
        tracing::info!("{:?}", label);

        let outcome = match self.lexicon.lookup_cached(&item.name).await {
            // 有時間戳記的單字：回寫原始的建立與更新時間
            Ok(Some(resolved)) => match item.timestamp {
                Some(timestamp) => {
                    self.lexicon
                        .store()
                        .overwrite_timestamps(&resolved.record.name, timestamp, timestamp)
                        .await
                }
                None => Ok(()),
            },
            Ok(None) => {
                let fetched = self.lexicon.fetch_and_save(&item.name, item.timestamp).await;
                // every provider call is followed by a pause, whatever it returned
                let delay = self.next_delay();
                tracing::debug!("Throttling for {:?}", delay);
                tokio::time::sleep(delay).await;
                report.throttled += 1;
                fetched.map(|_| ())
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => report.succeeded += 1,
            Err(e) => {
                if e.is_recoverable() {
                    tracing::warn!("Define {:?} failed: {}", item.name, e);
                } else {
                    tracing::error!("❌ Define {:?} failed: {}", item.name, e);
                }
                report.failed.push(label.to_string());
            }
        }
    }

    fn next_delay(&self) -> Duration {
        let min = self.min_delay.as_millis() as u64;
        let max = self.max_delay.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }
}

fn log_summary(report: &ImportReport) {
    tracing::info!("Successful definitions: {}", report.succeeded);
    tracing::info!("Failed definitions: {}", report.failed.len());
    for failed in &report.failed {
        tracing::info!("• {}", failed);
    }
}
