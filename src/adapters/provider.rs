use crate::domain::ports::{ConfigProvider, DictionaryProvider};
use crate::utils::error::{LexiconError, Result};
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

pub const DICTIONARY_API_SOURCE: &str = "dictionaryapi.com";

/// Client for the dictionaryapi.com collegiate JSON endpoint.
///
/// The key is only required once a lookup actually reaches the network, so cache-only sessions
/// work without one.
pub struct DictionaryApiClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl DictionaryApiClient {
    pub fn new(client: Client, endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        }
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self::new(
            client,
            config.provider_endpoint(),
            config.api_key().map(str::to_string),
        ))
    }

    /// `{endpoint}/{word}?key={key}` with the word path-escaped and the key query-escaped.
    fn lookup_url(&self, word: &str, api_key: &str) -> Result<Url> {
        let mut url = Url::parse(&self.endpoint).map_err(|e| LexiconError::ConfigError {
            message: format!("invalid provider endpoint {:?}: {}", self.endpoint, e),
        })?;
        url.path_segments_mut()
            .map_err(|_| LexiconError::ConfigError {
                message: format!("provider endpoint {:?} cannot be a base URL", self.endpoint),
            })?
            .pop_if_empty()
            .push(word);
        url.query_pairs_mut().append_pair("key", api_key);
        Ok(url)
    }
}

#[async_trait]
impl DictionaryProvider for DictionaryApiClient {
    async fn fetch(&self, word: &str) -> Result<Vec<u8>> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| LexiconError::MissingCredential {
                name: "DICTIONARY_API_KEY".to_string(),
            })?;

        let url = self.lookup_url(word, api_key)?;
        tracing::debug!("Fetching {:?} from {}", word, self.endpoint);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        tracing::debug!("Provider response status: {} ({} bytes)", status, body.len());

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            tracing::warn!("Got {}: {}", status, text);
            return Err(LexiconError::RemoteUnavailable {
                message: format!("service returned {}: {}", status, text),
            });
        }

        Ok(body.to_vec())
    }

    fn source_name(&self) -> &str {
        DICTIONARY_API_SOURCE
    }
}
