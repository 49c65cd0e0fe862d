//! Event bus feeding the interactive thread.
//!
//! Design principles:
//! - Background work (catalog scans, watcher, launches, stdin) only ever sends
//! - The interactive thread is the single receiver and the only one touching stores
//! - Batch processing (drain everything pending per wakeup)
//! - Bursts of catalog change notifications collapse into one

use crossbeam_channel::{Receiver, Sender};
use dock_apps::CatalogEntry;

/// How a launch request ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LaunchResult {
    Acknowledged,
    Failed(String),
    TimedOut,
}

#[derive(Clone, Debug)]
pub enum UiEvent {
    /// A line of user input.
    Command(String),
    /// A background scan finished.
    CatalogLoaded(Vec<CatalogEntry>),
    /// A catalog source changed on disk.
    CatalogChanged,
    /// The desktop answered (or did not) a launch request.
    LaunchFinished { name: String, result: LaunchResult },
    /// No more user input will arrive.
    InputClosed,
}

pub fn channel() -> (Sender<UiEvent>, Receiver<UiEvent>) {
    crossbeam_channel::unbounded()
}

/// `first` plus everything already queued, keeping only the first of
/// consecutive-or-not `CatalogChanged` notifications.
pub fn drain_batch(first: UiEvent, rx: &Receiver<UiEvent>) -> Vec<UiEvent> {
    let mut events = vec![first];
    events.extend(rx.try_iter());

    let mut seen_change = false;
    events.retain(|event| {
        if matches!(event, UiEvent::CatalogChanged) {
            if seen_change {
                return false;
            }
            seen_change = true;
        }
        true
    });

    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_batch_collapses_catalog_changes() {
        let (tx, rx) = channel();
        tx.send(UiEvent::CatalogChanged).unwrap();
        tx.send(UiEvent::Command("list".to_string())).unwrap();
        tx.send(UiEvent::CatalogChanged).unwrap();

        let batch = drain_batch(UiEvent::CatalogChanged, &rx);
        assert_eq!(batch.len(), 2);
        assert!(matches!(batch[0], UiEvent::CatalogChanged));
        assert!(matches!(&batch[1], UiEvent::Command(c) if c == "list"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_drain_batch_keeps_order() {
        let (tx, rx) = channel();
        tx.send(UiEvent::Command("b".to_string())).unwrap();
        tx.send(UiEvent::InputClosed).unwrap();

        let batch = drain_batch(UiEvent::Command("a".to_string()), &rx);
        let kinds: Vec<String> = batch
            .iter()
            .map(|e| match e {
                UiEvent::Command(c) => c.clone(),
                other => format!("{:?}", other),
            })
            .collect();
        assert_eq!(kinds, vec!["a", "b", "InputClosed"]);
    }
}
