pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{
    backend::CacheBackend, file_store::FileStore, provider::DictionaryApiClient,
    storage::LocalStorage,
};
pub use config::LexiconConfig;
pub use core::{
    batch::{BatchImporter, BatchItem},
    lexicon::Lexicon,
};
pub use utils::error::{LexiconError, Result};
