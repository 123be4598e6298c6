//! Scriptable stand-ins for the remote service and local storage.

use crate::error::RemoteError;
use crate::models::Snippet;
use crate::remote::{RemoteResult, RemoteSnippets};
use crate::storage::{SnippetStorage, StoreResult};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct FakeRemote {
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    stored: Vec<Snippet>,
    creates: usize,
    failing_creates: HashSet<usize>,
    ids: Vec<String>,
    deleted: Vec<String>,
    searches: usize,
    down: bool,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails as if the service were unreachable
    pub fn unreachable() -> Self {
        let remote = Self::default();
        remote.lock().down = true;
        remote
    }

    /// Fail the `n`th create call (1-based)
    pub fn fail_create(self, n: usize) -> Self {
        self.lock().failing_creates.insert(n);
        self
    }

    /// Hand out these ids, in order, before falling back to generated ones
    pub fn with_ids(self, ids: &[&str]) -> Self {
        self.lock().ids = ids.iter().rev().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_stored(self, snippets: Vec<Snippet>) -> Self {
        self.lock().stored = snippets;
        self
    }

    pub fn set_down(&self, down: bool) {
        self.lock().down = down;
    }

    pub fn create_calls(&self) -> usize {
        self.lock().creates
    }

    pub fn search_calls(&self) -> usize {
        self.lock().searches
    }

    pub fn deleted(&self) -> Vec<String> {
        self.lock().deleted.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }
}

fn unreachable_error() -> RemoteError {
    RemoteError::Transport("connection refused".to_string())
}

#[async_trait]
impl RemoteSnippets for FakeRemote {
    async fn create(&self, snippet: &Snippet) -> RemoteResult<Snippet> {
        let mut state = self.lock();
        state.creates += 1;
        if state.down {
            return Err(unreachable_error());
        }
        if state.failing_creates.contains(&state.creates) {
            return Err(RemoteError::Status {
                status: 500,
                body: "internal error".to_string(),
            });
        }

        let call = state.creates;
        let id = state
            .ids
            .pop()
            .unwrap_or_else(|| format!("remote-{}", call));
        let mut created = snippet.clone();
        created.id = Some(id);
        created.updated_at = Some(Utc::now());
        state.stored.push(created.clone());
        Ok(created)
    }

    async fn search(&self, query: Option<&str>) -> RemoteResult<Vec<Snippet>> {
        let mut state = self.lock();
        state.searches += 1;
        if state.down {
            return Err(unreachable_error());
        }
        Ok(state
            .stored
            .iter()
            .filter(|s| query.map_or(true, |q| s.matches(q)))
            .cloned()
            .collect())
    }

    async fn delete(&self, id: &str) -> RemoteResult<()> {
        let mut state = self.lock();
        state.deleted.push(id.to_string());
        if state.down {
            return Err(unreachable_error());
        }
        state.stored.retain(|s| s.id.as_deref() != Some(id));
        Ok(())
    }
}

/// Number of writes seen by a [`CountingStorage`]
#[derive(Clone, Default)]
pub struct SaveCounter(Arc<Mutex<usize>>);

impl SaveCounter {
    pub fn get(&self) -> usize {
        *self.0.lock().unwrap()
    }
}

/// Storage wrapper that counts wholesale writes
pub struct CountingStorage<S> {
    inner: S,
    counter: SaveCounter,
}

impl<S: SnippetStorage> CountingStorage<S> {
    pub fn new(inner: S) -> (Self, SaveCounter) {
        let counter = SaveCounter::default();
        (
            CountingStorage {
                inner,
                counter: counter.clone(),
            },
            counter,
        )
    }
}

impl<S: SnippetStorage> SnippetStorage for CountingStorage<S> {
    fn load(&self) -> StoreResult<Vec<Snippet>> {
        self.inner.load()
    }

    fn save(&self, snippets: &[Snippet]) -> StoreResult<()> {
        self.inner.save(snippets)?;
        *self.counter.0.lock().unwrap() += 1;
        Ok(())
    }
}

#[tokio::test]
async fn counting_storage_counts_writes() {
    use crate::storage::{LocalStore, MemoryStorage};

    let (storage, saves) = CountingStorage::new(MemoryStorage::new());
    let store = LocalStore::new(storage);

    let snippet = Snippet::new("a", "", "a()", "rust", Vec::new()).unwrap();
    store.append(snippet).await.unwrap();
    store.list().await.unwrap();

    assert_eq!(saves.get(), 1);
}
