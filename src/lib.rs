//! gmplayer - search, download and play music from a streaming catalog
//!
//! This library holds the catalog client, the local music store and the
//! player launcher that the `gmplayer` binary strings together.

/// Client modules for the remote catalog and local storage
pub mod clients;
/// Song, album and library-shuffle flows
pub mod jukebox;
/// External audio player
pub mod player;
/// Settings file handling
pub mod settings;
