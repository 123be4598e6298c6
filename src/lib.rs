//! snipsync - capture code snippets and keep them in sync with a remote service.
//!
//! Snippets are always written to a local store. When the remote service is
//! enabled, new snippets are created there first; anything that could not be
//! sent is picked up later by [`sync_pending`].

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod library;
pub mod models;
pub mod policy;
pub mod remote;
pub mod server;
pub mod storage;
pub mod sync;

#[cfg(test)]
mod testing;

// Re-export
pub use config::{get_config_dir, Config};
pub use error::{LocalStoreError, RemoteError, Result, SnipError};
pub use library::{SearchResults, SearchSource, SnippetLibrary};
pub use models::{language_from_path, normalize_tags, Snippet};
pub use policy::{SaveMode, SaveOutcome, SavePolicy};
pub use remote::{HttpRemote, RemoteSnippets};
pub use server::{routes, start_api_server, ServerState};
pub use storage::{JsonFileStorage, LocalStore, MemoryStorage, SnippetStorage};
pub use sync::{sync_pending, SyncReport};
