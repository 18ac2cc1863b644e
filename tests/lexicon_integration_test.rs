use httpmock::prelude::*;
use lexicon::core::lexicon::decode_document;
use lexicon::domain::model::Origin;
use lexicon::domain::ports::LexiconStore;
use lexicon::{CacheBackend, DictionaryApiClient, Lexicon, LexiconConfig, LexiconError};
use tempfile::TempDir;

const ANCHOR_RESPONSE: &str = r#"[
  {
    "meta": {"id": "anchor:1", "uuid": "3b2c", "sort": "010377000", "src": "collegiate",
             "section": "alpha", "stems": ["anchor", "anchors"], "offensive": false},
    "hwi": {"hw": "an*chor", "prs": [{"mw": "ˈaŋ-kər", "sound": {"audio": "anchor01"}}]},
    "fl": "noun",
    "def": [{"sseq": [
      [["sense", {"sn": "1", "dt": [["text", "{bc}a device usually of metal attached to a ship"]]}]],
      [["sense", {"sn": "2", "dt": [["text", "{bc}a reliable support"],
                                     ["vis", [{"t": "the {wi}anchor{/wi} of the family"}]]]}]]
    ]}],
    "shortdef": ["a device usually of metal attached to a ship", "a reliable support"]
  }
]"#;

fn file_config(server: &MockServer, data_dir: &TempDir) -> LexiconConfig {
    LexiconConfig::from_toml_str(&format!(
        r#"
[provider]
endpoint = "{}"
api_key = "test-key"

[cache]
backend = "file"
path = "{}"
"#,
        server.url("/collegiate/json"),
        data_dir.path().display()
    ))
    .unwrap()
}

#[tokio::test]
async fn test_define_fetches_once_then_serves_from_file_cache() -> anyhow::Result<()> {
    let data_dir = TempDir::new()?;
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/collegiate/json/anchor")
            .query_param("key", "test-key");
        then.status(200)
            .header("Content-Type", "application/json")
            .body(ANCHOR_RESPONSE);
    });

    let config = file_config(&server, &data_dir);
    let lexicon = Lexicon::new(
        CacheBackend::from_config(&config)?,
        DictionaryApiClient::from_config(&config)?,
    );

    let first = lexicon.resolve("Anchor").await?;
    let second = lexicon.resolve("anchor").await?;

    api_mock.assert_hits(1);
    assert_eq!(first.origin, Origin::Fetched);
    assert_eq!(second.origin, Origin::Cached);
    assert_eq!(first.document, second.document);

    let entry = &second.document.entries[0];
    assert_eq!(entry.headword.text, "an*chor");
    assert_eq!(entry.meta.source, "collegiate");
    assert_eq!(entry.definitions[0].senses.len(), 2);
    assert_eq!(
        entry.definitions[0].senses[1].illustrations,
        vec!["the {wi}anchor{/wi} of the family"]
    );
    assert_eq!(second.record.source, "dictionaryapi.com");

    // 檢查持久化的欄位
    let raw = std::fs::read(data_dir.path().join("lexicon.json"))?;
    let persisted: serde_json::Value = serde_json::from_slice(&raw)?;
    let row = &persisted[0];
    assert_eq!(row["name"], "anchor");
    assert!(row["createdAt"].is_i64());
    assert!(row["updatedAt"].is_i64());
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(row["definition"].as_str().unwrap())?,
        serde_json::to_value(&first.document)?
    );

    Ok(())
}

#[tokio::test]
async fn test_misspelling_surfaces_suggestions_and_is_not_cached() -> anyhow::Result<()> {
    let data_dir = TempDir::new()?;
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/collegiate/json/anchoar");
        then.status(200)
            .header("Content-Type", "application/json")
            .body(r#"["anchor","anchor's","anchors"]"#);
    });

    let config = file_config(&server, &data_dir);
    let lexicon = Lexicon::new(
        CacheBackend::from_config(&config)?,
        DictionaryApiClient::from_config(&config)?,
    );

    for _ in 0..2 {
        match lexicon.resolve("anchoar").await {
            Err(LexiconError::NoExactMatch { suggestions, .. }) => {
                assert_eq!(suggestions, vec!["anchor", "anchor's", "anchors"]);
            }
            other => panic!("expected suggestions, got {other:?}"),
        }
    }

    api_mock.assert_hits(2);
    assert!(lexicon.store().all().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_cache_hit_needs_no_api_key() -> anyhow::Result<()> {
    let data_dir = TempDir::new()?;
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.any_request();
        then.status(200).body(ANCHOR_RESPONSE);
    });

    let mut config = file_config(&server, &data_dir);
    let seeded = Lexicon::new(
        CacheBackend::from_config(&config)?,
        DictionaryApiClient::from_config(&config)?,
    );
    let fetched = seeded.resolve("anchor").await?;

    config.provider.api_key = None;
    let keyless = Lexicon::new(
        CacheBackend::from_config(&config)?,
        DictionaryApiClient::from_config(&config)?,
    );

    let cached = keyless.resolve("anchor").await?;
    assert_eq!(cached.origin, Origin::Cached);
    assert_eq!(decode_document(&cached.record)?, fetched.document);

    let err = keyless.resolve("ankh").await.unwrap_err();
    assert!(matches!(err, LexiconError::MissingCredential { .. }));
    api_mock.assert_hits(1);
    Ok(())
}

#[tokio::test]
async fn test_api_backend_saves_fetched_words() -> anyhow::Result<()> {
    let server = MockServer::start();
    let provider_mock = server.mock(|when, then| {
        when.method(GET).path("/collegiate/json/anchor");
        then.status(200).body(ANCHOR_RESPONSE);
    });
    let find_mock = server.mock(|when, then| {
        when.method(GET).path("/lexemes/anchor");
        then.status(404);
    });
    let create_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/lexemes/")
            .header("x-api-key", "service-key")
            .body_contains("\"lexeme\"")
            .body_contains("\"name\":\"anchor\"")
            .body_contains("\"created_at\"");
        then.status(201);
    });

    let config = LexiconConfig::from_toml_str(&format!(
        r#"
[provider]
endpoint = "{}"
api_key = "test-key"

[cache]
backend = "api"
endpoint = "{}"
api_key = "service-key"
"#,
        server.url("/collegiate/json"),
        server.base_url()
    ))?;
    let lexicon = Lexicon::new(
        CacheBackend::from_config(&config)?,
        DictionaryApiClient::from_config(&config)?,
    );

    let resolved = lexicon.resolve("anchor").await?;

    assert_eq!(resolved.origin, Origin::Fetched);
    find_mock.assert();
    provider_mock.assert();
    create_mock.assert();
    Ok(())
}
