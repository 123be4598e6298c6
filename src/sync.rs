//! Pushes locally created snippets to the remote service.

use crate::models::Snippet;
use crate::remote::RemoteSnippets;
use crate::storage::{LocalStore, StoreResult};
use tracing::{info, warn};

/// Aggregate result of a sync run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub synced: usize,
    pub failed: usize,
}

impl SyncReport {
    pub fn attempted(&self) -> usize {
        self.synced + self.failed
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Create every unsynced snippet remotely and record the returned identities.
///
/// Pending snippets are tracked by position, so two identical local snippets
/// each get their own server copy. A failed create leaves its slot untouched
/// and does not stop the rest. The store stays locked for the whole run and
/// the sequence is written back once at the end.
pub async fn sync_pending(
    store: &LocalStore,
    remote: &dyn RemoteSnippets,
) -> StoreResult<SyncReport> {
    let session = store.lock().await;
    let mut snippets = session.list()?;

    let pending = pending_positions(&snippets);
    if pending.is_empty() {
        info!("nothing to sync");
        return Ok(SyncReport::default());
    }

    let mut report = SyncReport::default();
    for index in pending {
        match remote.create(&snippets[index]).await {
            Ok(created) => {
                snippets[index] = created;
                report.synced += 1;
            }
            Err(e) => {
                warn!(title = %snippets[index].title, error = %e, "failed to sync snippet");
                report.failed += 1;
            }
        }
    }

    session.replace_all(&snippets)?;
    info!(synced = report.synced, failed = report.failed, "sync finished");
    Ok(report)
}

/// Positions of snippets still waiting for a remote id
pub fn pending_positions(snippets: &[Snippet]) -> Vec<usize> {
    snippets
        .iter()
        .enumerate()
        .filter(|(_, s)| !s.is_synced())
        .map(|(i, _)| i)
        .collect()
}
