//! Path helpers for XDG application directories.

use std::env;
use std::path::PathBuf;

/// Overrides the catalog sources with a colon-separated list of directories.
pub const APP_DIRS_ENV: &str = "FOLDERDOCK_APP_DIRS";

fn xdg_data_home() -> PathBuf {
    match env::var("XDG_DATA_HOME") {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs::home_dir()
            .unwrap_or_default()
            .join(".local/share"),
    }
}

fn xdg_data_dirs() -> Vec<PathBuf> {
    let raw = env::var("XDG_DATA_DIRS")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "/usr/local/share:/usr/share".to_string());

    split_dir_list(&raw)
}

/// Split a colon-separated directory list, dropping empty segments.
pub fn split_dir_list(raw: &str) -> Vec<PathBuf> {
    raw.split(':')
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Get all application .desktop file directories, highest priority first.
///
/// The user directory comes before the system ones so that a user's copy
/// of a desktop file shadows the packaged one.
pub fn get_application_directories() -> Vec<PathBuf> {
    if let Ok(raw) = env::var(APP_DIRS_ENV) {
        let dirs = split_dir_list(&raw);
        if !dirs.is_empty() {
            return dirs;
        }
    }

    let home = dirs::home_dir().unwrap_or_default();
    let mut dirs = vec![xdg_data_home().join("applications")];

    for data_dir in xdg_data_dirs() {
        dirs.push(data_dir.join("applications"));
    }

    dirs.push(PathBuf::from("/var/lib/flatpak/exports/share/applications"));
    dirs.push(home.join(".local/share/flatpak/exports/share/applications"));
    dirs.push(PathBuf::from("/var/lib/snapd/desktop/applications"));

    dedup_preserving_order(dirs)
}

fn dedup_preserving_order(dirs: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = Vec::with_capacity(dirs.len());
    for dir in dirs {
        if !out.contains(&dir) {
            out.push(dir);
        }
    }
    out
}
