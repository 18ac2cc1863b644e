// Adapters layer: concrete implementations of the domain ports (file/api cache stores, dictionary http client)

pub mod api_store;
pub mod backend;
pub mod file_store;
pub mod provider;
pub mod storage;
