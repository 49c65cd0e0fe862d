//! Application catalog scanning.

use crate::desktop_entry::parse_desktop_file;
use crate::error::ScanError;
use log::{debug, info, warn};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Extension of freedesktop application entries.
pub const DESKTOP_EXTENSION: &str = "desktop";

/// Events emitted when the catalog sources change.
#[derive(Debug, Clone)]
pub enum AppEvent {
    Refresh,
}

/// A candidate resource that can be pinned. Never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Label shown to the user and used to match pinned items.
    pub display_name: String,
    /// Live location of the resource at scan time.
    pub path: PathBuf,
}

impl CatalogEntry {
    pub fn new(display_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            display_name: display_name.into(),
            path: path.into(),
        }
    }

    /// Case-insensitive substring match on the display name.
    /// An empty query matches everything.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        query.is_empty()
            || self
                .display_name
                .to_lowercase()
                .contains(&query.to_lowercase())
    }
}

/// Keep the entries matching `query`, preserving order.
pub fn filter_entries<'a>(entries: &'a [CatalogEntry], query: &str) -> Vec<&'a CatalogEntry> {
    entries.iter().filter(|e| e.matches(query)).collect()
}

/// Enumerates installed applications from a list of source directories.
#[derive(Clone, Debug)]
pub struct CatalogScanner {
    sources: Vec<PathBuf>,
    extension: String,
    max_depth: usize,
}

impl CatalogScanner {
    pub fn new(sources: Vec<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            sources,
            extension: extension.into(),
            max_depth: 3,
        }
    }

    /// Limit how deep below each source directory the scan descends.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth.max(1);
        self
    }

    /// Perform a full enumeration of every source.
    ///
    /// Blocks on directory I/O, so callers on an interactive thread should
    /// run it elsewhere. Unreadable sources contribute nothing.
    pub fn scan(&self) -> Vec<CatalogEntry> {
        info!("Scanning app catalog...");

        let mut seen = HashSet::new();
        let mut entries = Vec::new();

        for dir in &self.sources {
            if let Err(e) = self.scan_source(dir, &mut seen, &mut entries) {
                debug!("{}", e);
            }
        }

        entries.sort_by(|a, b| {
            a.display_name
                .to_lowercase()
                .cmp(&b.display_name.to_lowercase())
                .then_with(|| a.display_name.cmp(&b.display_name))
                .then_with(|| a.path.cmp(&b.path))
        });

        info!("App catalog scan complete: {} entries", entries.len());
        entries
    }

    fn scan_source(
        &self,
        dir: &Path,
        seen: &mut HashSet<String>,
        out: &mut Vec<CatalogEntry>,
    ) -> Result<(), ScanError> {
        fs::read_dir(dir).map_err(|source| ScanError::Source {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(self.max_depth)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

        while let Some(next) = walker.next() {
            let entry = match next {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable catalog entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
                continue;
            }

            // Bundles are opaque: don't look for apps inside an app.
            if entry.file_type().is_dir() {
                walker.skip_current_dir();
            }

            // First source wins for a given id; a hidden shadowing entry
            // therefore also hides the entries it shadows.
            if !seen.insert(entry_id(dir, path)) {
                continue;
            }

            if let Some(candidate) = self.entry_for(path, entry.file_type().is_dir()) {
                out.push(candidate);
            }
        }

        Ok(())
    }

    fn entry_for(&self, path: &Path, is_dir: bool) -> Option<CatalogEntry> {
        if self.extension == DESKTOP_EXTENSION && !is_dir {
            let app = parse_desktop_file(path)?;
            if app.is_hidden() {
                return None;
            }
            return Some(CatalogEntry::new(app.name, path));
        }

        let stem = path.file_stem()?.to_string_lossy().to_string();
        Some(CatalogEntry::new(stem, path))
    }
}

/// Desktop-file id: the path below the source, separators replaced by `-`.
fn entry_id(source: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(source).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("-")
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

/// Watches catalog sources and reports changes.
/// Dropping the watcher stops it.
pub struct CatalogWatcher {
    _watcher: RecommendedWatcher,
}

impl CatalogWatcher {
    /// Start watching every existing source directory.
    /// `on_event` runs on the watcher's thread.
    pub fn start<F>(sources: &[PathBuf], on_event: F) -> Result<Self, ScanError>
    where
        F: Fn(AppEvent) + Send + 'static,
    {
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) if !event.kind.is_access() => on_event(AppEvent::Refresh),
                Ok(_) => {}
                Err(e) => warn!("Catalog watch error: {}", e),
            }
        })?;

        for dir in sources.iter().filter(|d| d.is_dir()) {
            if let Err(e) = watcher.watch(dir, RecursiveMode::Recursive) {
                warn!("Cannot watch {}: {}", dir.display(), e);
            }
        }

        Ok(Self { _watcher: watcher })
    }
}
