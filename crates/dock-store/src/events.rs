//! Store change notifications.
//!
//! Stores broadcast a `StoreEvent` after every mutation. The UI subscribes
//! and re-reads the snapshot it cares about; events carry no payload beyond
//! what is needed to tell them apart.

use log::error;
use tokio::sync::broadcast::{self, Receiver, Sender};

/// Broadcast channel capacity.
/// Lagging receivers skip old events; they only need to know something changed.
pub const CHANNEL_CAPACITY: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    /// The pinned item collection changed.
    ItemsChanged,
    /// Display preferences changed.
    SettingsChanged,
    /// A durable write failed even after a retry; in-memory state is kept.
    PersistFailed { key: String },
}

/// Create a sender to share between the stores of one process.
pub fn channel() -> Sender<StoreEvent> {
    let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
    tx
}

/// Drain every pending event, skipping over lag.
pub fn drain(rx: &mut Receiver<StoreEvent>) -> Vec<StoreEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(broadcast::error::TryRecvError::Empty) => break,
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(broadcast::error::TryRecvError::Closed) => break,
        }
    }
    events
}

/// Non-blocking; dropped when nobody listens.
pub(crate) fn notify(tx: &Sender<StoreEvent>, event: StoreEvent) {
    let _ = tx.send(event);
}

pub(crate) fn report_persist_failure(
    tx: &Sender<StoreEvent>,
    key: String,
    err: &crate::PersistenceError,
) {
    error!("Failed to persist {}: {}", key, err);
    notify(tx, StoreEvent::PersistFailed { key });
}
