//! dock-apps: application catalog and launcher for Linux desktops.
//!
//! Provides:
//! - Catalog scanning of .desktop files (or any typed entries) from XDG directories
//! - Desktop entry parsing, including `Exec` field code expansion
//! - Change watching of the catalog sources
//! - An asynchronous process launcher

mod catalog;
mod desktop_entry;
pub mod error;
mod launcher;
pub mod paths;

pub use catalog::{
    AppEvent, CatalogEntry, CatalogScanner, CatalogWatcher, DESKTOP_EXTENSION, filter_entries,
};
pub use desktop_entry::{DesktopApp, parse_desktop_entry, parse_desktop_file};
pub use error::{LaunchError, ScanError};
pub use launcher::{DesktopLauncher, LaunchFuture, LaunchRequest, Launcher};

