//! Provider response parsing: dictionaryapi.com collegiate JSON into [`LexiconDocument`].
//!
//! Reference: <https://dictionaryapi.com/products/json>. Only the fields the domain model keeps
//! are declared; everything else in the provider records is ignored.

use crate::core::node::Node;
use crate::core::senses::normalize_senses;
use crate::domain::model::{
    Cognate, Definition, Entry, EntryMeta, Headword, LexiconDocument, Pronunciation, Quote,
};
use crate::utils::error::{LexiconError, Result};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMeta {
    id: String,
    uuid: String,
    sort: String,
    src: String,
    section: String,
    stems: Vec<String>,
    offensive: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSound {
    audio: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPronunciation {
    mw: String,
    sound: Option<RawSound>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawHeadwordInfo {
    hw: String,
    prs: Vec<RawPronunciation>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCrossRefTarget {
    cxt: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCrossRef {
    cxl: String,
    cxtis: Vec<RawCrossRefTarget>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAttribution {
    auth: String,
    source: String,
    aqdate: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawQuote {
    t: String,
    aq: RawAttribution,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDefinition {
    vd: Option<String>,
    sseq: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawEntry {
    meta: RawMeta,
    hwi: RawHeadwordInfo,
    cxs: Vec<RawCrossRef>,
    fl: Option<String>,
    // 定義區塊逐一解析，單一區塊格式錯誤時只略過該區塊
    def: Vec<Value>,
    quotes: Vec<RawQuote>,
    shortdef: Vec<String>,
}

/// Returns the spelling suggestions when `body` is a JSON array made only of strings.
///
/// Any other shape, including an array with a single non-string element, yields an empty list
/// so the caller falls through to entry parsing.
pub fn try_parse_suggestions(body: &[u8]) -> Vec<String> {
    serde_json::from_slice::<Vec<String>>(body).unwrap_or_default()
}

/// Turns a provider response body for `word` into a normalized document.
pub fn parse_response(word: &str, body: &[u8]) -> Result<LexiconDocument> {
    let suggestions = try_parse_suggestions(body);
    if !suggestions.is_empty() {
        return Err(LexiconError::NoExactMatch {
            word: word.to_string(),
            suggestions,
        });
    }

    let records: Vec<Value> =
        serde_json::from_slice(body).map_err(|e| LexiconError::MalformedResponse {
            message: format!("expected an array of entries: {}", e),
        })?;

    if records.is_empty() {
        return Err(LexiconError::NoExactMatch {
            word: word.to_string(),
            suggestions: Vec::new(),
        });
    }

    let total = records.len();
    let mut entries = Vec::with_capacity(total);
    for (index, record) in records.into_iter().enumerate() {
        match serde_json::from_value::<RawEntry>(record) {
            Ok(raw) => entries.push(normalize_entry(raw)),
            Err(e) => {
                tracing::warn!("Skipping entry {} of {:?}: {}", index, word, e);
            }
        }
    }

    if entries.is_empty() {
        return Err(LexiconError::MalformedResponse {
            message: format!("none of the {} entries for {:?} could be read", total, word),
        });
    }

    Ok(LexiconDocument { entries })
}

fn normalize_entry(raw: RawEntry) -> Entry {
    let entry_id = raw.meta.id.clone();

    Entry {
        meta: EntryMeta {
            id: raw.meta.id,
            uuid: raw.meta.uuid,
            sort: raw.meta.sort,
            source: raw.meta.src,
            section: raw.meta.section,
            stems: raw.meta.stems,
            offensive: raw.meta.offensive,
        },
        headword: Headword {
            text: raw.hwi.hw,
            pronunciations: raw.hwi.prs.into_iter().map(normalize_pronunciation).collect(),
        },
        cognates: raw
            .cxs
            .into_iter()
            .map(|cx| Cognate {
                label: cx.cxl,
                targets: cx.cxtis.into_iter().map(|t| t.cxt).collect(),
            })
            .collect(),
        grammatical_function: raw.fl.filter(|fl| !fl.is_empty()),
        short_definitions: raw.shortdef,
        definitions: normalize_definitions(&entry_id, raw.def),
        quotes: raw
            .quotes
            .into_iter()
            .map(|q| Quote {
                text: q.t,
                author: q.aq.auth,
                source: q.aq.source,
                publication_date: q.aq.aqdate,
            })
            .collect(),
    }
}

fn normalize_pronunciation(raw: RawPronunciation) -> Pronunciation {
    Pronunciation {
        text: raw.mw,
        sound_ref: raw
            .sound
            .and_then(|sound| sound.audio)
            .filter(|audio| !audio.is_empty()),
    }
}

fn normalize_definitions(entry_id: &str, blocks: Vec<Value>) -> Vec<Definition> {
    let mut definitions = Vec::with_capacity(blocks.len());
    for block in blocks {
        let raw = match serde_json::from_value::<RawDefinition>(block) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Skipping malformed definition block in {:?}: {}", entry_id, e);
                continue;
            }
        };
        definitions.push(Definition {
            verb_divider: raw.vd.filter(|vd| !vd.is_empty()),
            senses: normalize_senses(&Node::from(raw.sseq)),
        });
    }
    definitions
}
