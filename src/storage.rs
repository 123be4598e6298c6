use crate::error::LocalStoreError;
use crate::models::Snippet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex};
use tempfile::NamedTempFile;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

pub type StoreResult<T> = std::result::Result<T, LocalStoreError>;

/// A durable slot holding the whole snippet sequence.
///
/// Reads and writes are always wholesale.
pub trait SnippetStorage: Send {
    fn load(&self) -> StoreResult<Vec<Snippet>>;
    fn save(&self, snippets: &[Snippet]) -> StoreResult<()>;
}

/// Snippets kept as a pretty-printed JSON array in a single file
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStorage { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnippetStorage for JsonFileStorage {
    fn load(&self) -> StoreResult<Vec<Snippet>> {
        if !self.path.exists() {
            return Ok(vec![]);
        }

        let content = fs::read_to_string(&self.path)?;

        // Handle empty database file
        if content.trim().is_empty() {
            return Ok(vec![]);
        }

        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, snippets: &[Snippet]) -> StoreResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let serialized = serde_json::to_string_pretty(snippets)?;

        // Write next to the target and rename so a crash never leaves half a file
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(serialized.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!(path = %self.path.display(), count = snippets.len(), "saved snippets");
        Ok(())
    }
}

/// In-process storage for tests and throwaway servers
#[derive(Default)]
pub struct MemoryStorage {
    snippets: StdMutex<Vec<Snippet>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snippets(snippets: Vec<Snippet>) -> Self {
        MemoryStorage {
            snippets: StdMutex::new(snippets),
        }
    }
}

impl SnippetStorage for MemoryStorage {
    fn load(&self) -> StoreResult<Vec<Snippet>> {
        Ok(self
            .snippets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    fn save(&self, snippets: &[Snippet]) -> StoreResult<()> {
        *self
            .snippets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = snippets.to_vec();
        Ok(())
    }
}

/// The single owner of the local snippet sequence.
///
/// Cloning shares the same storage. Every operation holds the lock for its
/// whole read-modify-write cycle, so two commands in one process can never
/// interleave and lose an update.
#[derive(Clone)]
pub struct LocalStore {
    storage: Arc<Mutex<Box<dyn SnippetStorage>>>,
}

impl LocalStore {
    pub fn new(storage: impl SnippetStorage + 'static) -> Self {
        let storage: Box<dyn SnippetStorage> = Box::new(storage);
        LocalStore {
            storage: Arc::new(Mutex::new(storage)),
        }
    }

    /// Store backed by a JSON file at `path`
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(JsonFileStorage::new(path))
    }

    /// Store with nothing persisted
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }

    /// Append a snippet to the end of the sequence
    pub async fn append(&self, snippet: Snippet) -> StoreResult<()> {
        let session = self.lock().await;
        let mut snippets = session.list()?;
        snippets.push(snippet);
        session.replace_all(&snippets)
    }

    /// Current sequence, empty if nothing has been saved yet
    pub async fn list(&self) -> StoreResult<Vec<Snippet>> {
        self.lock().await.list()
    }

    /// Overwrite the whole sequence
    pub async fn replace_all(&self, snippets: &[Snippet]) -> StoreResult<()> {
        self.lock().await.replace_all(snippets)
    }

    /// Exclusive access for a multi-step read-modify-write
    pub async fn lock(&self) -> StoreSession<'_> {
        StoreSession {
            storage: self.storage.lock().await,
        }
    }
}

/// Exclusive hold on the local sequence; released on drop
pub struct StoreSession<'a> {
    storage: MutexGuard<'a, Box<dyn SnippetStorage>>,
}

impl StoreSession<'_> {
    pub fn list(&self) -> StoreResult<Vec<Snippet>> {
        self.storage.load()
    }

    pub fn replace_all(&self, snippets: &[Snippet]) -> StoreResult<()> {
        self.storage.save(snippets)
    }
}
