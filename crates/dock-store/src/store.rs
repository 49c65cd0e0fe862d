//! The pinned item store.
//!
//! Owns the ordered collection and is the unit of persistence: every
//! mutating call updates the in-memory sequence, broadcasts a change and
//! then rewrites the whole record before returning.
//!
//! Items are matched to catalog entries by display name, so two different
//! resources sharing a name are indistinguishable to `toggle`/`is_pinned`.

use crate::error::ResolutionError;
use crate::events::{self, StoreEvent};
use crate::item::PinnedItem;
use crate::persistence::{ITEMS_KEY, PersistenceGateway};
use dock_apps::{CatalogEntry, LaunchFuture, LaunchRequest, Launcher};
use log::{info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast::{Receiver, Sender};
use uuid::Uuid;

/// Result of `PinnedItemStore::toggle`.
#[derive(Debug)]
pub enum ToggleOutcome {
    Pinned(Uuid),
    Unpinned(Uuid),
    /// The entry's resource could not be captured; nothing was added.
    Skipped(ResolutionError),
}

pub struct PinnedItemStore {
    items: Vec<PinnedItem>,
    gateway: Arc<PersistenceGateway>,
    events: Sender<StoreEvent>,
}

impl PinnedItemStore {
    /// Hydrate from the gateway. A missing or corrupt record is an empty store.
    pub fn load(gateway: Arc<PersistenceGateway>, events: Sender<StoreEvent>) -> Self {
        let stored: Vec<PinnedItem> = gateway.load(ITEMS_KEY).unwrap_or_default();
        let items = dedup(stored);
        info!("Loaded {} pinned items for {}", items.len(), gateway.instance());

        Self {
            items,
            gateway,
            events,
        }
    }

    /// Current collection in display order.
    pub fn items(&self) -> &[PinnedItem] {
        &self.items
    }

    pub fn snapshot(&self) -> Vec<PinnedItem> {
        self.items.clone()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&PinnedItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn position(&self, id: Uuid) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    pub fn is_pinned(&self, entry: &CatalogEntry) -> bool {
        self.find_by_name(&entry.display_name).is_some()
    }

    /// Unpin the item named like `entry`, or pin `entry` at the end.
    pub fn toggle(&mut self, entry: &CatalogEntry) -> ToggleOutcome {
        let outcome = match self.find_by_name(&entry.display_name) {
            Some(existing) => {
                let id = self.items[existing].id();
                self.items.retain(|item| item.id() != id);
                ToggleOutcome::Unpinned(id)
            }
            None => match PinnedItem::pin(entry) {
                Ok(item) => {
                    let id = item.id();
                    self.items.push(item);
                    ToggleOutcome::Pinned(id)
                }
                Err(e) => {
                    warn!("Cannot pin {}: {}", entry.display_name, e);
                    ToggleOutcome::Skipped(e)
                }
            },
        };

        let changed = !matches!(outcome, ToggleOutcome::Skipped(_));
        self.commit(changed);
        outcome
    }

    /// Remove the item with `id`. Unknown ids change nothing, but the record
    /// is still rewritten. Returns whether an item was removed.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id() != id);
        let removed = self.items.len() != before;
        self.commit(removed);
        removed
    }

    /// Move the item at `from` to index `to`, shifting the ones in between.
    ///
    /// # Panics
    /// If either index is out of bounds.
    pub fn reorder(&mut self, from: usize, to: usize) {
        let len = self.items.len();
        assert!(from < len, "reorder source {} out of bounds (len {})", from, len);
        assert!(to < len, "reorder destination {} out of bounds (len {})", to, len);

        if from == to {
            return;
        }

        let item = self.items.remove(from);
        self.items.insert(to, item);
        self.commit(true);
    }

    /// Move several items at once, list-view style.
    ///
    /// The items at `offsets` keep their relative order and end up just
    /// before the element that was at `destination` (or at the end when
    /// `destination == len`).
    ///
    /// # Panics
    /// If an offset is `>= len` or `destination > len`.
    pub fn move_items(&mut self, offsets: &[usize], destination: usize) {
        let len = self.items.len();
        assert!(
            destination <= len,
            "move destination {} out of bounds (len {})",
            destination,
            len
        );

        let mut sorted: Vec<usize> = offsets.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        if let Some(&last) = sorted.last() {
            assert!(last < len, "move offset {} out of bounds (len {})", last, len);
        }

        let before_destination = sorted.iter().filter(|&&i| i < destination).count();
        let mut moved = Vec::with_capacity(sorted.len());
        for &index in sorted.iter().rev() {
            moved.push(self.items.remove(index));
        }
        moved.reverse();

        let insert_at = destination - before_destination;
        self.items.splice(insert_at..insert_at, moved);
        self.commit(!sorted.is_empty());
    }

    /// Resolve `item` and ask `launcher` to open it.
    ///
    /// Returns the acknowledgement future for the caller to drive, or `None`
    /// when the item no longer resolves. Scoped access is held only while
    /// the request is built.
    pub fn launch(&self, item: &PinnedItem, launcher: &dyn Launcher) -> Option<LaunchFuture> {
        let access = match item.locator().access() {
            Ok(access) => access,
            Err(e) => {
                warn!("Cannot launch {}: {}", item.display_name(), e);
                return None;
            }
        };

        if access.is_stale() {
            warn!(
                "Locator of {} is stale, launching {}",
                item.display_name(),
                access.path().display()
            );
        }

        info!("Launching {}", item.display_name());
        Some(launcher.open(LaunchRequest {
            path: access.path().to_path_buf(),
            activate: true,
        }))
    }

    pub fn subscribe(&self) -> Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn find_by_name(&self, name: &str) -> Option<usize> {
        self.items.iter().position(|item| item.display_name() == name)
    }

    fn commit(&self, changed: bool) {
        if changed {
            events::notify(&self.events, StoreEvent::ItemsChanged);
        }
        if let Err(e) = self.gateway.save(ITEMS_KEY, &self.items) {
            events::report_persist_failure(&self.events, self.gateway.key(ITEMS_KEY), &e);
        }
    }
}

/// Keep the first item for every id and every display name.
fn dedup(items: Vec<PinnedItem>) -> Vec<PinnedItem> {
    let mut ids = HashSet::new();
    let mut names = HashSet::new();
    let mut kept = Vec::with_capacity(items.len());

    for item in items {
        if !ids.insert(item.id()) || !names.insert(item.display_name().to_string()) {
            warn!("Dropping duplicate pinned item {} ({})", item.display_name(), item.id());
            continue;
        }
        kept.push(item);
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::drain;
    use crate::locator::Locator;
    use crate::persistence::MemoryBackend;
    use dock_apps::LaunchError;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct Fixture {
        tmp: TempDir,
        backend: Arc<MemoryBackend>,
        gateway: Arc<PersistenceGateway>,
        events: Sender<StoreEvent>,
    }

    impl Fixture {
        fn new() -> Self {
            let backend = Arc::new(MemoryBackend::new());
            Self {
                tmp: TempDir::new().unwrap(),
                gateway: Arc::new(PersistenceGateway::new(backend.clone(), "Dock")),
                backend,
                events: events::channel(),
            }
        }

        fn store(&self) -> PinnedItemStore {
            PinnedItemStore::load(self.gateway.clone(), self.events.clone())
        }

        fn entry(&self, name: &str) -> CatalogEntry {
            let path = self.tmp.path().join(format!("{}.desktop", name.to_lowercase()));
            if !path.exists() {
                fs::write(&path, format!("[Desktop Entry]\nType=Application\nName={}\n", name)).unwrap();
            }
            CatalogEntry::new(name, path)
        }
    }

    fn names(store: &PinnedItemStore) -> Vec<&str> {
        store.items().iter().map(|i| i.display_name()).collect()
    }

    fn seeded(fx: &Fixture, list: &[&str]) -> PinnedItemStore {
        let mut store = fx.store();
        for name in list {
            store.toggle(&fx.entry(name));
        }
        store
    }

    #[test]
    fn test_toggle_scenario() {
        let fx = Fixture::new();
        let mut store = fx.store();
        let mail = fx.entry("Mail");

        assert!(matches!(store.toggle(&mail), ToggleOutcome::Pinned(_)));
        assert_eq!(names(&store), vec!["Mail"]);
        assert!(store.is_pinned(&mail));

        assert!(matches!(store.toggle(&mail), ToggleOutcome::Unpinned(_)));
        assert!(store.is_empty());

        store.toggle(&mail);
        store.toggle(&fx.entry("Notes"));
        store.reorder(0, 1);
        assert_eq!(names(&store), vec!["Notes", "Mail"]);
    }

    #[test]
    fn test_toggle_parity_keeps_first_toggle_order() {
        let fx = Fixture::new();
        let mut store = fx.store();
        let sequence = ["Mail", "Notes", "Maps", "Mail", "Music", "Maps", "Mail", "Notes", "Notes"];

        for name in sequence {
            store.toggle(&fx.entry(name));
        }

        // Mail x3, Notes x3, Maps x2, Music x1. Mail and Notes were unpinned
        // and pinned again, so they sit behind Music.
        assert_eq!(names(&store), vec!["Music", "Mail", "Notes"]);
        let unique: HashSet<Uuid> = store.items().iter().map(|i| i.id()).collect();
        assert_eq!(unique.len(), store.len());
    }

    #[test]
    fn test_toggle_sequences_match_pin_list_model() {
        const NAMES: [&str; 3] = ["Mail", "Notes", "Maps"];

        for len in 0..=5u32 {
            for code in 0..3usize.pow(len) {
                let sequence: Vec<&str> = (0..len)
                    .map(|i| NAMES[code / 3usize.pow(i) % 3])
                    .collect();

                let fx = Fixture::new();
                let mut store = fx.store();
                let mut model: Vec<&str> = Vec::new();
                for name in &sequence {
                    store.toggle(&fx.entry(name));
                    match model.iter().position(|n| n == name) {
                        Some(index) => {
                            model.remove(index);
                        }
                        None => model.push(*name),
                    }
                }

                assert_eq!(names(&store), model, "sequence {:?}", sequence);
                for name in NAMES {
                    let odd = sequence.iter().filter(|n| **n == name).count() % 2 == 1;
                    assert_eq!(store.is_pinned(&fx.entry(name)), odd, "sequence {:?}", sequence);
                }
                let unique: HashSet<Uuid> = store.items().iter().map(|i| i.id()).collect();
                assert_eq!(unique.len(), store.len());
                assert_eq!(names(&fx.store()), model, "reloaded {:?}", sequence);
            }
        }
    }

    #[test]
    fn test_toggle_without_removal_appends_in_first_toggle_order() {
        let fx = Fixture::new();
        let store = seeded(&fx, &["Zed", "Alpha", "Mail"]);
        assert_eq!(names(&store), vec!["Zed", "Alpha", "Mail"]);
    }

    #[test]
    fn test_toggle_matches_by_display_name_not_resource() {
        let fx = Fixture::new();
        let mut store = fx.store();
        let system_mail = fx.entry("Mail");
        let other_path = fx.tmp.path().join("other-mail.desktop");
        fs::write(&other_path, "").unwrap();
        let other_mail = CatalogEntry::new("Mail", other_path);

        store.toggle(&system_mail);
        assert!(store.is_pinned(&other_mail));

        // Toggling a different resource with the same name unpins the first.
        assert!(matches!(store.toggle(&other_mail), ToggleOutcome::Unpinned(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_toggle_of_vanished_resource_is_skipped_but_persisted() {
        let fx = Fixture::new();
        let mut store = fx.store();
        let ghost = CatalogEntry::new("Ghost", fx.tmp.path().join("ghost.desktop"));

        assert!(matches!(store.toggle(&ghost), ToggleOutcome::Skipped(_)));
        assert!(store.is_empty());
        assert_eq!(fx.backend.writes(), 1);
    }

    #[test]
    fn test_every_mutation_persists() {
        let fx = Fixture::new();
        let mut store = seeded(&fx, &["Mail", "Notes", "Maps"]);
        assert_eq!(fx.backend.writes(), 3);

        store.reorder(0, 2);
        store.move_items(&[0], 3);
        let id = store.items()[0].id();
        store.remove(id);
        assert_eq!(fx.backend.writes(), 6);
    }

    #[test]
    fn test_remove_unknown_id_is_noop_but_writes() {
        let fx = Fixture::new();
        let mut store = seeded(&fx, &["Mail", "Notes"]);
        let before = store.snapshot();
        let writes = fx.backend.writes();
        let mut rx = store.subscribe();

        assert!(!store.remove(Uuid::new_v4()));
        assert_eq!(store.snapshot(), before);
        assert_eq!(fx.backend.writes(), writes + 1);
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_remove_by_id() {
        let fx = Fixture::new();
        let mut store = seeded(&fx, &["Mail", "Notes", "Maps"]);
        let notes = store.items()[1].id();

        assert!(store.remove(notes));
        assert_eq!(names(&store), vec!["Mail", "Maps"]);
        assert!(store.get(notes).is_none());
    }

    #[test]
    fn test_reorder_is_self_inverse() {
        let fx = Fixture::new();
        let mut store = seeded(&fx, &["A", "B", "C", "D", "E"]);
        let original = store.snapshot();

        for from in 0..original.len() {
            for to in 0..original.len() {
                store.reorder(from, to);
                store.reorder(to, from);
                assert_eq!(store.snapshot(), original, "reorder({}, {})", from, to);
            }
        }
    }

    #[test]
    fn test_reorder_shifts_intervening_items() {
        let fx = Fixture::new();
        let mut store = seeded(&fx, &["A", "B", "C", "D"]);

        store.reorder(3, 1);
        assert_eq!(names(&store), vec!["A", "D", "B", "C"]);
        store.reorder(0, 2);
        assert_eq!(names(&store), vec!["D", "B", "A", "C"]);
    }

    #[test]
    fn test_reorder_same_index_does_not_write() {
        let fx = Fixture::new();
        let mut store = seeded(&fx, &["A", "B"]);
        let writes = fx.backend.writes();

        store.reorder(1, 1);
        assert_eq!(fx.backend.writes(), writes);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_reorder_out_of_range_panics() {
        let fx = Fixture::new();
        let mut store = seeded(&fx, &["A", "B"]);
        store.reorder(0, 2);
    }

    #[test]
    fn test_move_items_list_semantics() {
        let fx = Fixture::new();
        let mut store = seeded(&fx, &["A", "B", "C", "D", "E"]);

        store.move_items(&[0, 2], 4);
        assert_eq!(names(&store), vec!["B", "D", "A", "C", "E"]);

        store.move_items(&[4, 3, 3], 0);
        assert_eq!(names(&store), vec!["C", "E", "B", "D", "A"]);

        store.move_items(&[1], 5);
        assert_eq!(names(&store), vec!["C", "B", "D", "A", "E"]);

        store.move_items(&[2], 2);
        assert_eq!(names(&store), vec!["C", "B", "D", "A", "E"]);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_move_items_out_of_range_panics() {
        let fx = Fixture::new();
        let mut store = seeded(&fx, &["A"]);
        store.move_items(&[1], 0);
    }

    #[test]
    fn test_persist_then_load_round_trip() {
        for count in [0usize, 1, 2, 7] {
            let fx = Fixture::new();
            let list: Vec<String> = (0..count).map(|i| format!("App {}", i)).collect();
            let refs: Vec<&str> = list.iter().map(String::as_str).collect();
            let mut store = seeded(&fx, &refs);
            if count > 1 {
                store.reorder(0, count - 1);
            }

            let reloaded = fx.store();
            assert_eq!(reloaded.snapshot(), store.snapshot(), "{} items", count);
        }
    }

    #[test]
    fn test_unresolvable_items_still_load() {
        let fx = Fixture::new();
        let mut store = seeded(&fx, &["Mail"]);
        let mail_path = fx.entry("Mail").path;
        store.toggle(&fx.entry("Notes"));
        fs::remove_file(mail_path).unwrap();

        let reloaded = fx.store();
        assert_eq!(names(&reloaded), vec!["Mail", "Notes"]);
        assert!(reloaded.items()[0].resolve().is_err());
        assert!(reloaded.items()[1].resolve().is_ok());
    }

    #[test]
    fn test_missing_or_corrupt_record_loads_empty() {
        let fx = Fixture::new();
        assert!(fx.store().is_empty());

        fx.backend.insert_raw("saved_apps_Dock", "[{\"id\": 12}]");
        assert!(fx.store().is_empty());

        fx.backend.insert_raw("saved_apps_Dock", "{truncated");
        assert!(fx.store().is_empty());
    }

    #[test]
    fn test_load_drops_duplicates() {
        let fx = Fixture::new();
        let a = PinnedItem::new("Mail", Locator::from_token("a.b"));
        let b = PinnedItem::new("Notes", Locator::from_token("c.d"));
        let same_name = PinnedItem::new("Mail", Locator::from_token("e.f"));
        let record = serde_json::to_vec(&vec![a.clone(), b.clone(), a.clone(), same_name]).unwrap();
        fx.backend.insert_raw("saved_apps_Dock", record);

        assert_eq!(fx.store().snapshot(), vec![a, b]);
    }

    #[test]
    fn test_mutations_notify_subscribers() {
        let fx = Fixture::new();
        let mut store = fx.store();
        let mut rx = store.subscribe();

        store.toggle(&fx.entry("Mail"));
        store.toggle(&fx.entry("Notes"));
        store.reorder(0, 1);
        assert_eq!(drain(&mut rx), vec![StoreEvent::ItemsChanged; 3]);
    }

    #[test]
    fn test_persist_failure_keeps_memory_state_and_reports() {
        let fx = Fixture::new();
        let mut store = fx.store();
        let mut rx = store.subscribe();

        fx.backend.fail_next_writes(2);
        store.toggle(&fx.entry("Mail"));

        assert_eq!(names(&store), vec!["Mail"]);
        assert_eq!(
            drain(&mut rx),
            vec![
                StoreEvent::ItemsChanged,
                StoreEvent::PersistFailed {
                    key: "saved_apps_Dock".to_string()
                }
            ]
        );
        assert!(fx.store().is_empty());
    }

    #[derive(Default)]
    struct RecordingLauncher {
        opened: Mutex<Vec<PathBuf>>,
    }

    impl Launcher for RecordingLauncher {
        fn open(&self, request: LaunchRequest) -> LaunchFuture {
            self.opened.lock().unwrap().push(request.path);
            Box::pin(async { Ok::<(), LaunchError>(()) })
        }
    }

    #[tokio::test]
    async fn test_launch_opens_resolved_path() {
        let fx = Fixture::new();
        let store = seeded(&fx, &["Mail"]);
        let launcher = RecordingLauncher::default();

        let ack = store.launch(&store.items()[0], &launcher).unwrap();
        ack.await.unwrap();

        let opened = launcher.opened.lock().unwrap();
        assert_eq!(opened.len(), 1);
        assert_eq!(
            opened[0],
            fs::canonicalize(fx.tmp.path().join("mail.desktop")).unwrap()
        );
    }

    #[test]
    fn test_launch_of_unresolvable_item_is_noop() {
        let fx = Fixture::new();
        let store = seeded(&fx, &["Mail"]);
        fs::remove_file(fx.entry("Mail").path).unwrap();
        let launcher = RecordingLauncher::default();

        assert!(store.launch(&store.items()[0], &launcher).is_none());
        assert!(launcher.opened.lock().unwrap().is_empty());
    }
}
