/// Catalog trait and its HTTP client
pub mod catalog;
/// Track downloads into local storage
pub mod downloader;
/// Data entities for tracks, albums and search results
pub mod entities;
/// Error types and result aliases
pub mod errors;
/// Local music store layout and playlists
pub mod local_storage;
#[cfg(test)]
pub(crate) mod testing;

pub use catalog::{Catalog, HttpCatalog};
pub use downloader::Downloader;
pub use local_storage::LocalStorage;
