//! Runtime configuration, resolved from the environment once at startup.

use dock_apps::paths::get_application_directories;
use dock_store::persistence::{default_state_dir, instance_name};
use std::path::PathBuf;
use std::time::Duration;

/// Bounded wait for a launch acknowledgement, in milliseconds.
pub const LAUNCH_TIMEOUT_ENV: &str = "FOLDERDOCK_LAUNCH_TIMEOUT_MS";
const DEFAULT_LAUNCH_TIMEOUT_MS: u64 = 5000;

#[derive(Clone, Debug)]
pub struct DockConfig {
    /// Namespace of every persisted record.
    pub instance: String,
    /// Directory of the file-backed key-value store.
    pub state_dir: PathBuf,
    /// Catalog sources, highest priority first.
    pub app_dirs: Vec<PathBuf>,
    pub launch_timeout: Duration,
}

impl DockConfig {
    pub fn from_env() -> Self {
        let launch_timeout_ms = std::env::var(LAUNCH_TIMEOUT_ENV)
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_LAUNCH_TIMEOUT_MS);

        Self {
            instance: instance_name(),
            state_dir: default_state_dir(),
            app_dirs: get_application_directories(),
            launch_timeout: Duration::from_millis(launch_timeout_ms),
        }
    }
}
