//! Shared state for the table change feed.
//!
//! Mutating handlers publish a `TableChange` whenever they insert, update or
//! delete a row. A long-running updater task drains the channel and bumps a
//! per-table version counter. Clients poll `GET /api/changes` and refetch a
//! page's data when the version of its table moves; the feed is eventually
//! consistent and provides no ordering guarantee beyond "last fetch wins".

use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, RwLock};

/// A thread-safe, shareable container for table change versions.
///
/// Created in `main.rs` and shared across the Actix application as
/// `web::Data`. The `versions` map is the single source of truth; it is
/// protected by an `Arc<RwLock>` so the poll endpoint can read concurrently
/// while the updater task holds the only write path.
#[derive(Clone)]
pub struct ChangesState {
    pub versions: Arc<RwLock<HashMap<String, u64>>>,
    pub tx: mpsc::Sender<TableChange>,
}

/// One mutation notification for a table.
#[derive(Debug)]
pub struct TableChange {
    pub table: &'static str,
}

impl ChangesState {
    /// Fire-and-forget publication. A full channel only means a poll cycle
    /// sees the bump one message later, so the send result is ignored.
    pub fn publish(&self, table: &'static str) {
        let _ = self.tx.try_send(TableChange { table });
    }
}

/// Central updater task: listens for `TableChange` messages and bumps the
/// corresponding version counter. Spawned once from `main.rs`.
pub async fn start_change_feed(state: ChangesState, mut rx: mpsc::Receiver<TableChange>) {
    while let Some(change) = rx.recv().await {
        let mut versions = state.versions.write().await;
        *versions.entry(change.table.to_string()).or_insert(0) += 1;
    }
}
