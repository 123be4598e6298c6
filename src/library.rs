use crate::config::Config;
use crate::error::{Result, SnipError};
use crate::models::Snippet;
use crate::policy::{SaveMode, SaveOutcome, SavePolicy};
use crate::remote::{HttpRemote, RemoteSnippets};
use crate::storage::LocalStore;
use crate::sync::{sync_pending, SyncReport};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where search results came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchSource {
    Remote,
    Local,
}

#[derive(Debug)]
pub struct SearchResults {
    pub snippets: Vec<Snippet>,
    pub source: SearchSource,
}

/// Everything a front end needs: save, sync, delete, search and listing,
/// wired to one local store and one remote endpoint.
pub struct SnippetLibrary {
    store: LocalStore,
    remote: Arc<dyn RemoteSnippets>,
    policy: SavePolicy,
}

impl SnippetLibrary {
    pub fn new(config: Config, store: LocalStore, remote: Arc<dyn RemoteSnippets>) -> Self {
        let policy = SavePolicy::new(&config, store.clone(), remote.clone());
        SnippetLibrary {
            store,
            remote,
            policy,
        }
    }

    /// Library backed by the configured snippet file and HTTP endpoint
    pub fn open(config: Config) -> Self {
        let store = LocalStore::open(config.db_file_path());
        let remote = Arc::new(HttpRemote::from_config(&config));
        Self::new(config, store, remote)
    }

    pub fn save_mode(&self) -> SaveMode {
        self.policy.mode()
    }

    pub async fn save(&self, snippet: Snippet) -> Result<SaveOutcome> {
        Ok(self.policy.save(snippet).await?)
    }

    /// Push unsynced snippets. Runs in either save mode.
    pub async fn sync(&self) -> Result<SyncReport> {
        Ok(sync_pending(&self.store, self.remote.as_ref()).await?)
    }

    pub async fn list(&self) -> Result<Vec<Snippet>> {
        Ok(self.store.list().await?)
    }

    /// Snippet at a 0-based position in the local sequence
    pub async fn get(&self, position: usize) -> Result<Snippet> {
        self.store
            .list()
            .await?
            .into_iter()
            .nth(position)
            .ok_or(SnipError::NotFound(position))
    }

    /// Remove the snippet at a 0-based position.
    ///
    /// The local removal is persisted first. Synced snippets are then deleted
    /// remotely; a remote failure is logged and does not undo the local delete.
    pub async fn delete(&self, position: usize) -> Result<Snippet> {
        let removed = {
            let session = self.store.lock().await;
            let mut snippets = session.list()?;
            if position >= snippets.len() {
                return Err(SnipError::NotFound(position));
            }
            let removed = snippets.remove(position);
            session.replace_all(&snippets)?;
            removed
        };
        info!(title = %removed.title, "deleted snippet");

        match removed.id.as_deref() {
            Some(id) if removed.is_synced() => {
                if let Err(e) = self.remote.delete(id).await {
                    warn!(id, title = %removed.title, error = %e, "remote delete failed");
                }
            }
            _ => debug!(title = %removed.title, "snippet was never synced, skipping remote delete"),
        }

        Ok(removed)
    }

    /// Search remotely in remote mode, locally otherwise or when the remote is down
    pub async fn search(&self, query: Option<&str>) -> Result<SearchResults> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());

        if self.save_mode() == SaveMode::Remote {
            match self.remote.search(query).await {
                Ok(snippets) => {
                    return Ok(SearchResults {
                        snippets,
                        source: SearchSource::Remote,
                    })
                }
                Err(e) => warn!(error = %e, "remote search failed, searching local snippets"),
            }
        }

        let snippets = self
            .store
            .list()
            .await?
            .into_iter()
            .filter(|s| query.map_or(true, |q| s.matches(q)))
            .collect();
        Ok(SearchResults {
            snippets,
            source: SearchSource::Local,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LocalStoreError;
    use crate::storage::{MemoryStorage, SnippetStorage, StoreResult};
    use crate::testing::FakeRemote;
    use std::io;

    fn config(use_api: bool) -> Config {
        Config {
            use_api,
            ..Config::default()
        }
    }

    fn snippet(title: &str) -> Snippet {
        Snippet::new(title, "", format!("code {}", title), "rust", Vec::new()).unwrap()
    }

    fn synced(title: &str, id: &str) -> Snippet {
        let mut s = snippet(title);
        s.id = Some(id.to_string());
        s
    }

    fn library(
        use_api: bool,
        snippets: Vec<Snippet>,
        remote: FakeRemote,
    ) -> (SnippetLibrary, Arc<FakeRemote>) {
        let remote = Arc::new(remote);
        let store = LocalStore::new(MemoryStorage::with_snippets(snippets));
        (
            SnippetLibrary::new(config(use_api), store, remote.clone()),
            remote,
        )
    }

    #[tokio::test]
    async fn deleting_unsynced_snippet_skips_remote() {
        let (lib, remote) = library(true, vec![snippet("a"), snippet("b")], FakeRemote::new());

        let removed = lib.delete(0).await.unwrap();

        assert_eq!(removed.title, "a");
        assert!(remote.deleted().is_empty());
        let left = lib.list().await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].title, "b");
    }

    #[tokio::test]
    async fn deleting_synced_snippet_calls_remote() {
        let (lib, remote) = library(false, vec![synced("a", "11"), snippet("b")], FakeRemote::new());

        lib.delete(0).await.unwrap();

        assert_eq!(remote.deleted(), vec!["11".to_string()]);
        assert_eq!(lib.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn remote_delete_failure_still_removes_locally() {
        let (lib, remote) = library(true, vec![synced("a", "11")], FakeRemote::unreachable());

        lib.delete(0).await.unwrap();

        assert_eq!(remote.deleted(), vec!["11".to_string()]);
        assert!(lib.list().await.unwrap().is_empty());
    }

    struct ReadOnlyStorage(Vec<Snippet>);

    impl SnippetStorage for ReadOnlyStorage {
        fn load(&self) -> StoreResult<Vec<Snippet>> {
            Ok(self.0.clone())
        }

        fn save(&self, _snippets: &[Snippet]) -> StoreResult<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only").into())
        }
    }

    #[tokio::test]
    async fn failed_local_delete_leaves_remote_untouched() {
        let remote = Arc::new(FakeRemote::new().with_stored(vec![synced("a", "11")]));
        let store = LocalStore::new(ReadOnlyStorage(vec![synced("a", "11")]));
        let lib = SnippetLibrary::new(config(true), store, remote.clone());

        let err = lib.delete(0).await.unwrap_err();

        assert!(matches!(err, SnipError::LocalStore(LocalStoreError::Io(_))));
        assert!(remote.deleted().is_empty());
        assert_eq!(remote.search(None).await.unwrap().len(), 1);
        assert_eq!(lib.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_out_of_range_is_not_found() {
        let (lib, _) = library(false, vec![snippet("a")], FakeRemote::new());

        let err = lib.delete(3).await.unwrap_err();
        assert!(matches!(err, SnipError::NotFound(3)));
        assert_eq!(lib.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn get_returns_snippet_by_position() {
        let (lib, _) = library(false, vec![snippet("a"), snippet("b")], FakeRemote::new());

        assert_eq!(lib.get(1).await.unwrap().title, "b");
        assert!(matches!(lib.get(2).await, Err(SnipError::NotFound(2))));
    }

    #[tokio::test]
    async fn local_only_search_filters_local_snippets() {
        let (lib, remote) = library(
            false,
            vec![snippet("tokio spawn"), snippet("serde derive")],
            FakeRemote::new(),
        );

        let results = lib.search(Some("serde")).await.unwrap();

        assert_eq!(results.source, SearchSource::Local);
        assert_eq!(results.snippets.len(), 1);
        assert_eq!(results.snippets[0].title, "serde derive");
        assert_eq!(remote.search_calls(), 0);
    }

    #[tokio::test]
    async fn remote_search_falls_back_to_local_when_down() {
        let (lib, remote) = library(true, vec![snippet("tokio spawn")], FakeRemote::unreachable());

        let results = lib.search(Some("tokio")).await.unwrap();

        assert_eq!(remote.search_calls(), 1);
        assert_eq!(results.source, SearchSource::Local);
        assert_eq!(results.snippets.len(), 1);
    }

    #[tokio::test]
    async fn remote_search_returns_remote_results() {
        let remote = FakeRemote::new().with_stored(vec![synced("remote only", "1")]);
        let (lib, _) = library(true, vec![], remote);

        let results = lib.search(None).await.unwrap();

        assert_eq!(results.source, SearchSource::Remote);
        assert_eq!(results.snippets[0].title, "remote only");
    }

    #[tokio::test]
    async fn offline_save_then_sync_assigns_ids() {
        let (lib, remote) = library(true, vec![], FakeRemote::unreachable());

        let outcome = lib.save(snippet("offline")).await.unwrap();
        assert!(outcome.is_degraded());

        remote.set_down(false);
        let report = lib.sync().await.unwrap();

        assert_eq!(report.synced, 1);
        let saved = lib.list().await.unwrap();
        assert_eq!(saved.len(), 1);
        assert!(saved[0].is_synced());
    }

    #[tokio::test]
    async fn delete_waits_for_running_sync() {
        let (lib, _) = library(true, vec![snippet("a"), snippet("b")], FakeRemote::new());
        let lib = Arc::new(lib);

        let syncing = {
            let lib = lib.clone();
            tokio::spawn(async move { lib.sync().await })
        };
        let deleting = {
            let lib = lib.clone();
            tokio::spawn(async move { lib.delete(0).await })
        };

        syncing.await.unwrap().unwrap();
        deleting.await.unwrap().unwrap();

        let left = lib.list().await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].title, "b");
    }
}
