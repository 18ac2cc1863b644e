use crate::domain::model::{CacheRecord, Stat};
use crate::domain::ports::LexiconStore;
use crate::utils::error::{LexiconError, Result};
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

const BACKEND: &str = "api";

/// Cache store backed by a remote lexicon service exposing `/lexemes/` and `/stats`.
pub struct ApiStore {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

/// A record as the lexicon service stores it: snake_case fields, RFC 3339 timestamps.
#[derive(Debug, Serialize, Deserialize)]
struct Lexeme {
    name: String,
    definition: String,
    source: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<Lexeme> for CacheRecord {
    fn from(lexeme: Lexeme) -> Self {
        CacheRecord {
            name: lexeme.name,
            definition: lexeme.definition,
            source: lexeme.source,
            created_at: lexeme.created_at,
            updated_at: lexeme.updated_at,
        }
    }
}

impl From<CacheRecord> for Lexeme {
    fn from(record: CacheRecord) -> Self {
        Lexeme {
            name: record.name,
            definition: record.definition,
            source: record.source,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Serialize)]
struct CreateRequest {
    lexeme: Lexeme,
}

impl ApiStore {
    pub fn new(client: Client, endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        }
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| LexiconError::MissingCredential {
                name: "cache.api_key".to_string(),
            })
    }

    /// `{endpoint}/{segments...}`; an empty last segment leaves a trailing slash.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint).map_err(|e| LexiconError::ConfigError {
            message: format!("invalid cache endpoint {:?}: {}", self.endpoint, e),
        })?;
        url.path_segments_mut()
            .map_err(|_| LexiconError::ConfigError {
                message: format!("cache endpoint {:?} cannot be a base URL", self.endpoint),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn unavailable(response: Response) -> LexiconError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::warn!("Got {}: {}", status, body);
        LexiconError::RemoteUnavailable {
            message: format!("lexicon service returned {}: {}", status, body),
        }
    }
}

impl LexiconStore for ApiStore {
    async fn find(&self, name: &str) -> Result<Option<CacheRecord>> {
        let url = self.url(&["lexemes", name])?;
        tracing::debug!("Looking up cached lexeme: {}", url);

        let response = self.client.get(url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            status if !status.is_success() => return Err(Self::unavailable(response).await),
            _ => {}
        }

        let body = response.text().await?;
        serde_json::from_str::<Lexeme>(&body)
            .map(|lexeme| Some(lexeme.into()))
            .map_err(|e| LexiconError::CacheCorrupt {
                name: name.to_string(),
                message: e.to_string(),
            })
    }

    async fn save(&self, record: CacheRecord) -> Result<()> {
        let api_key = self.api_key()?;
        let name = record.name.clone();

        let url = self.url(&["lexemes", ""])?;
        let response = self
            .client
            .post(url)
            .header("X-API-KEY", api_key)
            .json(&CreateRequest {
                lexeme: record.into(),
            })
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::CREATED {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        if body.contains("already exists") {
            tracing::info!("{} already exists in the lexicon service", name);
            return Ok(());
        }

        Err(LexiconError::CacheWriteFailure {
            name,
            message: format!("lexicon service returned {}: {}", status, body),
        })
    }

    async fn overwrite_timestamps(
        &self,
        _name: &str,
        _created_at: DateTime<Utc>,
        _updated_at: DateTime<Utc>,
    ) -> Result<()> {
        Err(LexiconError::Unsupported {
            operation: "overwriting timestamps".to_string(),
            backend: BACKEND.to_string(),
        })
    }

    async fn all(&self) -> Result<Vec<CacheRecord>> {
        Err(LexiconError::Unsupported {
            operation: "listing records".to_string(),
            backend: BACKEND.to_string(),
        })
    }

    async fn remove(&self, name: &str) -> Result<bool> {
        let api_key = self.api_key()?;
        let url = self.url(&["lexemes", name])?;
        tracing::debug!("Deleting cached lexeme: {}", url);

        let response = self
            .client
            .delete(url)
            .header("X-API-KEY", api_key)
            .send()
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            _ => Err(Self::unavailable(response).await),
        }
    }

    async fn stats(&self) -> Result<Vec<Stat>> {
        let url = self.url(&["stats"])?;
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Self::unavailable(response).await);
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| LexiconError::MalformedResponse {
            message: format!("unexpected stats document: {}", e),
        })
    }
}
