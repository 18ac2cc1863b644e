pub mod batch;
pub mod entry;
pub mod lexicon;
pub mod node;
pub mod senses;

pub use crate::domain::model::{LexiconDocument, Origin, Resolved};
pub use crate::domain::ports::{DictionaryProvider, LexiconStore};
pub use crate::utils::error::Result;
