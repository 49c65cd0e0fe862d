//! Catalog scanning and watching, off the interactive thread.
//!
//! Results come back as `UiEvent`s; nothing here touches a store.

use crate::event_bus::UiEvent;
use crossbeam_channel::Sender;
use dock_apps::{AppEvent, CatalogScanner, CatalogWatcher};
use log::{info, warn};
use std::path::PathBuf;
use std::thread;

/// Run a full scan on a background thread and post the result.
pub fn start_scan(scanner: CatalogScanner, tx: Sender<UiEvent>) {
    info!("Starting app catalog scan...");

    thread::spawn(move || {
        let entries = scanner.scan();
        let _ = tx.send(UiEvent::CatalogLoaded(entries));
    });
}

/// Watch the catalog sources; changes are posted as `UiEvent::CatalogChanged`.
/// Returns None when no watcher could be created.
pub fn start_watcher(sources: &[PathBuf], tx: Sender<UiEvent>) -> Option<CatalogWatcher> {
    let watcher = CatalogWatcher::start(sources, move |event| match event {
        AppEvent::Refresh => {
            let _ = tx.send(UiEvent::CatalogChanged);
        }
    });

    match watcher {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            warn!("Catalog watcher unavailable: {}", e);
            None
        }
    }
}
