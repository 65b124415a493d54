//! Persistence coordinator
//!
//! Local edits are applied optimistically by the editor and then handed to
//! this coordinator as [`Mutation`]s. A single worker task drains them in
//! issue order and reports anything the editor has to reconcile as an
//! [`Outcome`].
//!
//! ```text
//! editor --submit--> [ mpsc queue ] --> worker --store calls--> PlaylistStore
//!   ^                                     |
//!   +------------ Outcome channel --------+
//! ```
//!
//! Duration writes are held for a short window and merged per item, so a
//! slider drag reaches the store once. Any structural mutation flushes them
//! first, which keeps the store seeing writes in the order they were made.

use crate::error::{EditorError, Result};
use signage_core::{
    AssetId, Error, PlaylistId, PlaylistItem, PlaylistItemId, PlaylistStore, PositionUpdate,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};

/// Issue order of a submitted mutation
pub type Seq = u64;

/// One optimistic edit, with what the editor needs to undo it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Insert {
        provisional_id: PlaylistItemId,
        asset_id: AssetId,
        position: u32,
        override_seconds: Option<u32>,
        /// Items pushed one slot to the right
        shifted: Vec<PositionUpdate>,
    },
    Delete {
        item: PlaylistItem,
        index: usize,
        /// Items pulled one slot to the left
        shifted: Vec<PositionUpdate>,
    },
    Reorder {
        item_id: PlaylistItemId,
        from: usize,
        to: usize,
        changes: Vec<PositionUpdate>,
    },
    SetDuration {
        item_id: PlaylistItemId,
        previous: Option<u32>,
        value: Option<u32>,
    },
    /// Position repair (store returned gaps, or a stale item was dropped)
    Renumber { changes: Vec<PositionUpdate> },
}

impl Mutation {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Insert { .. } => "insert",
            Self::Delete { .. } => "delete",
            Self::Reorder { .. } => "reorder",
            Self::SetDuration { .. } => "set_duration",
            Self::Renumber { .. } => "renumber",
        }
    }

    /// Everything except duration writes changes the order or the item set
    pub fn is_structural(&self) -> bool {
        !matches!(self, Self::SetDuration { .. })
    }
}

/// What the editor has to reconcile
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The store assigned an ID to a provisionally inserted item
    Inserted {
        provisional_id: PlaylistItemId,
        item: PlaylistItem,
    },
    /// The store refused the write; nothing was applied
    Rejected {
        seq: Seq,
        mutation: Mutation,
        error: Error,
    },
    /// The write did not reach the store
    Failed {
        seq: Seq,
        mutation: Mutation,
        error: Error,
    },
    /// Store state is unknown; re-fetch the item list
    ResyncRequired { seq: Seq, reason: String },
    /// The item no longer exists in the store
    Stale { seq: Seq, item_id: PlaylistItemId },
}

#[derive(Debug)]
enum Command {
    Apply { seq: Seq, mutation: Mutation },
    Flush(oneshot::Sender<()>),
}

/// Handle to the persistence worker
#[derive(Debug)]
pub struct PersistenceCoordinator {
    tx: Option<mpsc::UnboundedSender<Command>>,
    outcomes: mpsc::UnboundedReceiver<Outcome>,
    in_flight: Arc<AtomicUsize>,
    next_seq: Seq,
    worker: Option<JoinHandle<()>>,
}

impl PersistenceCoordinator {
    /// Start the worker for one playlist. Must be called inside a tokio
    /// runtime.
    pub fn spawn(
        store: Arc<dyn PlaylistStore>,
        playlist_id: PlaylistId,
        coalesce_window: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcomes) = mpsc::unbounded_channel();
        let in_flight = Arc::new(AtomicUsize::new(0));

        let worker = Worker {
            store,
            playlist_id,
            window: coalesce_window,
            ids: HashMap::new(),
            dead: HashSet::new(),
            pending: Vec::new(),
            flush_at: None,
            outcomes: outcome_tx,
            in_flight: Arc::clone(&in_flight),
        };
        let handle = tokio::spawn(worker.run(rx));

        Self {
            tx: Some(tx),
            outcomes,
            in_flight,
            next_seq: 1,
            worker: Some(handle),
        }
    }

    /// Queue a mutation; returns its sequence number
    pub fn submit(&mut self, mutation: Mutation) -> Result<Seq> {
        let tx = self.tx.as_ref().ok_or(EditorError::Closed)?;
        let seq = self.next_seq;

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        if tx.send(Command::Apply { seq, mutation }).is_err() {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            return Err(EditorError::Closed);
        }
        self.next_seq += 1;
        Ok(seq)
    }

    /// True while any write is queued, held for coalescing, or executing
    pub fn saving(&self) -> bool {
        self.in_flight() > 0
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn try_next_outcome(&mut self) -> Option<Outcome> {
        self.outcomes.try_recv().ok()
    }

    /// Wait for the next outcome; `None` once the worker has stopped and
    /// every outcome was taken
    pub async fn next_outcome(&mut self) -> Option<Outcome> {
        self.outcomes.recv().await
    }

    /// Write out held duration changes and wait until everything submitted so
    /// far was processed
    pub async fn flush(&self) -> Result<()> {
        let tx = self.tx.as_ref().ok_or(EditorError::Closed)?;
        let (done_tx, done_rx) = oneshot::channel();
        tx.send(Command::Flush(done_tx))
            .map_err(|_| EditorError::Closed)?;
        done_rx.await.map_err(|_| EditorError::Closed)
    }

    /// Close the queue and wait for already queued writes to finish
    pub async fn shutdown(&mut self) {
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                tracing::error!(error = %e, "Persistence worker panicked");
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_none()
    }
}

struct PendingDuration {
    seq: Seq,
    item_id: PlaylistItemId,
    /// Override before the first write of the burst
    previous: Option<u32>,
    value: Option<u32>,
}

struct Worker {
    store: Arc<dyn PlaylistStore>,
    playlist_id: PlaylistId,
    window: Duration,

    /// Provisional ID -> store ID
    ids: HashMap<PlaylistItemId, PlaylistItemId>,

    /// Items that do not exist in the store (failed insert, deleted)
    dead: HashSet<PlaylistItemId>,

    /// Held duration writes, in arrival order
    pending: Vec<PendingDuration>,
    flush_at: Option<Instant>,

    outcomes: mpsc::UnboundedSender<Outcome>,
    in_flight: Arc<AtomicUsize>,
}

impl Worker {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        tracing::debug!(playlist = %self.playlist_id, "Persistence worker started");

        loop {
            let command = match self.flush_at {
                Some(at) => {
                    tokio::select! {
                        command = rx.recv() => command,
                        _ = tokio::time::sleep_until(at) => {
                            self.flush_durations().await;
                            continue;
                        }
                    }
                }
                None => rx.recv().await,
            };

            match command {
                Some(Command::Apply { seq, mutation }) => self.apply(seq, mutation).await,
                Some(Command::Flush(done)) => {
                    self.flush_durations().await;
                    let _ = done.send(());
                }
                None => {
                    self.flush_durations().await;
                    break;
                }
            }
        }

        tracing::debug!(playlist = %self.playlist_id, "Persistence worker stopped");
    }

    async fn apply(&mut self, seq: Seq, mutation: Mutation) {
        if let Mutation::SetDuration {
            item_id,
            previous,
            value,
        } = mutation
        {
            self.hold_duration(seq, item_id, previous, value);
            return;
        }

        self.flush_durations().await;
        tracing::debug!(seq, kind = mutation.kind(), "Persisting mutation");
        self.execute(seq, mutation).await;
        self.finish(1);
    }

    fn hold_duration(
        &mut self,
        seq: Seq,
        item_id: PlaylistItemId,
        previous: Option<u32>,
        value: Option<u32>,
    ) {
        if let Some(pending) = self.pending.iter_mut().find(|p| p.item_id == item_id) {
            pending.seq = seq;
            pending.value = value;
            // The superseded write will never be sent
            self.finish(1);
            tracing::trace!(seq, item = %item_id, "Duration write merged");
            return;
        }

        self.pending.push(PendingDuration {
            seq,
            item_id,
            previous,
            value,
        });
        if self.flush_at.is_none() {
            self.flush_at = Some(Instant::now() + self.window);
        }
    }

    async fn flush_durations(&mut self) {
        self.flush_at = None;
        let pending = std::mem::take(&mut self.pending);

        for write in pending {
            self.write_duration(write).await;
            self.finish(1);
        }
    }

    async fn write_duration(&mut self, write: PendingDuration) {
        if self.dead.contains(&write.item_id) {
            tracing::debug!(item = %write.item_id, "Skipping duration write for missing item");
            return;
        }

        let id = self.resolve(&write.item_id);
        if let Err(error) = self.store.update_item_duration(&id, write.value).await {
            let mutation = Mutation::SetDuration {
                item_id: write.item_id,
                previous: write.previous,
                value: write.value,
            };
            self.report(write.seq, mutation, error);
        }
    }

    async fn execute(&mut self, seq: Seq, mutation: Mutation) {
        match &mutation {
            Mutation::Insert {
                provisional_id,
                asset_id,
                position,
                override_seconds,
                shifted,
            } => {
                let inserted = self
                    .store
                    .insert_item(&self.playlist_id, asset_id, *position, *override_seconds)
                    .await;
                match inserted {
                    Ok(item) => {
                        tracing::debug!(provisional = %provisional_id, persisted = %item.id, "Item persisted");
                        self.ids.insert(provisional_id.clone(), item.id.clone());
                        self.emit(Outcome::Inserted {
                            provisional_id: provisional_id.clone(),
                            item,
                        });
                        self.follow_up(seq, shifted).await;
                    }
                    Err(error) => {
                        self.dead.insert(provisional_id.clone());
                        self.report(seq, mutation.clone(), error);
                    }
                }
            }

            Mutation::Delete { item, shifted, .. } => {
                if self.dead.contains(&item.id) {
                    tracing::debug!(item = %item.id, "Delete of an item the store never had");
                    return;
                }
                let id = self.resolve(&item.id);
                match self.store.delete_item(&id).await {
                    Ok(()) => {}
                    Err(error) if error.is_not_found() => {
                        tracing::debug!(item = %id, "Item already deleted");
                    }
                    Err(error) => {
                        self.report(seq, mutation.clone(), error);
                        return;
                    }
                }
                self.dead.insert(item.id.clone());
                self.dead.insert(id);
                self.follow_up(seq, shifted).await;
            }

            Mutation::Reorder { changes, .. } | Mutation::Renumber { changes } => {
                if let Err(error) = self.write_positions(changes).await {
                    self.report(seq, mutation.clone(), error);
                }
            }

            Mutation::SetDuration { .. } => {}
        }
    }

    /// Position batch that completes an insert or delete. The first half
    /// already landed, so any failure leaves the store in an unknown order.
    async fn follow_up(&mut self, seq: Seq, shifted: &[PositionUpdate]) {
        if let Err(error) = self.write_positions(shifted).await {
            tracing::warn!(seq, error = %error, "Position batch after insert/delete failed");
            self.emit(Outcome::ResyncRequired {
                seq,
                reason: error.to_string(),
            });
        }
    }

    async fn write_positions(&self, changes: &[PositionUpdate]) -> signage_core::Result<()> {
        let updates: Vec<PositionUpdate> = changes
            .iter()
            .filter(|u| !self.dead.contains(&u.item_id))
            .map(|u| PositionUpdate::new(self.resolve(&u.item_id), u.position))
            .collect();
        if updates.is_empty() {
            return Ok(());
        }
        self.store.update_item_positions(&updates).await
    }

    fn report(&self, seq: Seq, mutation: Mutation, error: Error) {
        tracing::warn!(seq, kind = mutation.kind(), error = %error, "Store write failed");

        let outcome = if error.requires_resync() {
            Outcome::ResyncRequired {
                seq,
                reason: error.to_string(),
            }
        } else if error.is_not_found() {
            match mutation {
                Mutation::SetDuration { item_id, .. } => Outcome::Stale { seq, item_id },
                Mutation::Insert { .. } => Outcome::Rejected {
                    seq,
                    mutation,
                    error,
                },
                // Some record in the batch vanished
                _ => Outcome::ResyncRequired {
                    seq,
                    reason: error.to_string(),
                },
            }
        } else if error.is_transient() {
            Outcome::Failed {
                seq,
                mutation,
                error,
            }
        } else {
            Outcome::Rejected {
                seq,
                mutation,
                error,
            }
        };
        self.emit(outcome);
    }

    fn resolve(&self, id: &PlaylistItemId) -> PlaylistItemId {
        self.ids.get(id).cloned().unwrap_or_else(|| id.clone())
    }

    fn emit(&self, outcome: Outcome) {
        // The editor may already be gone during shutdown
        let _ = self.outcomes.send(outcome);
    }

    fn finish(&self, count: usize) {
        self.in_flight.fetch_sub(count, Ordering::SeqCst);
    }
}
