//! Decides where a newly captured snippet is written.

use crate::config::Config;
use crate::error::RemoteError;
use crate::models::Snippet;
use crate::remote::RemoteSnippets;
use crate::storage::{LocalStore, StoreResult};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveMode {
    LocalOnly,
    Remote,
}

impl SaveMode {
    pub fn from_config(config: &Config) -> Self {
        if config.use_api {
            SaveMode::Remote
        } else {
            SaveMode::LocalOnly
        }
    }
}

/// How a save ended. The caller is expected to render each one differently.
#[derive(Debug)]
pub enum SaveOutcome {
    /// Created remotely, server copy stored locally
    RemoteAndLocal(Snippet),
    /// Local-only mode
    Local(Snippet),
    /// Remote create failed; stored locally without an id
    LocalFallback { snippet: Snippet, error: RemoteError },
}

impl SaveOutcome {
    /// The snippet as it was persisted locally
    pub fn snippet(&self) -> &Snippet {
        match self {
            SaveOutcome::RemoteAndLocal(snippet) | SaveOutcome::Local(snippet) => snippet,
            SaveOutcome::LocalFallback { snippet, .. } => snippet,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, SaveOutcome::LocalFallback { .. })
    }
}

pub struct SavePolicy {
    mode: SaveMode,
    store: LocalStore,
    remote: Arc<dyn RemoteSnippets>,
}

impl SavePolicy {
    pub fn new(config: &Config, store: LocalStore, remote: Arc<dyn RemoteSnippets>) -> Self {
        SavePolicy {
            mode: SaveMode::from_config(config),
            store,
            remote,
        }
    }

    pub fn mode(&self) -> SaveMode {
        self.mode
    }

    /// Persist a new snippet.
    ///
    /// Every snippet ends up in the local store. Only a local write failure is
    /// an error; a remote failure degrades to [`SaveOutcome::LocalFallback`].
    pub async fn save(&self, snippet: Snippet) -> StoreResult<SaveOutcome> {
        if self.mode == SaveMode::LocalOnly {
            self.store.append(snippet.clone()).await?;
            info!(title = %snippet.title, "saved snippet locally");
            return Ok(SaveOutcome::Local(snippet));
        }

        match self.remote.create(&snippet).await {
            Ok(created) => {
                self.store.append(created.clone()).await?;
                info!(title = %created.title, id = ?created.id, "saved snippet remotely");
                Ok(SaveOutcome::RemoteAndLocal(created))
            }
            Err(error) => {
                warn!(title = %snippet.title, %error, "remote save failed, keeping snippet locally");
                self.store.append(snippet.clone()).await?;
                Ok(SaveOutcome::LocalFallback { snippet, error })
            }
        }
    }
}
