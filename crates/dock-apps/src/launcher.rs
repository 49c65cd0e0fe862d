//! Process launcher.
//!
//! Opening is asynchronous: `Launcher::open` returns a future that resolves
//! once the desktop acknowledged the request, so callers can attach their
//! own continuation (hide the window, report an error).

use crate::catalog::DESKTOP_EXTENSION;
use crate::desktop_entry::parse_desktop_file;
use crate::error::LaunchError;
use futures_util::future::BoxFuture;
use log::{debug, info};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

/// Future resolved when a launch request was acknowledged.
pub type LaunchFuture = BoxFuture<'static, Result<(), LaunchError>>;

/// A request to open an application.
#[derive(Clone, Debug)]
pub struct LaunchRequest {
    pub path: PathBuf,
    /// Ask for the launched app to come to the foreground.
    pub activate: bool,
}

/// Anything able to open an application at a live path.
pub trait Launcher: Send + Sync {
    fn open(&self, request: LaunchRequest) -> LaunchFuture;
}

/// Launches desktop entries by running their `Exec` line and opens every
/// other path with a generic opener (`xdg-open` by default).
#[derive(Clone, Debug)]
pub struct DesktopLauncher {
    opener: String,
    terminal: String,
}

impl Default for DesktopLauncher {
    fn default() -> Self {
        Self {
            opener: "xdg-open".to_string(),
            terminal: std::env::var("TERMINAL").unwrap_or_else(|_| "x-terminal-emulator".to_string()),
        }
    }
}

impl DesktopLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different program for non-desktop paths.
    pub fn with_opener(mut self, opener: impl Into<String>) -> Self {
        self.opener = opener.into();
        self
    }
}

impl Launcher for DesktopLauncher {
    fn open(&self, request: LaunchRequest) -> LaunchFuture {
        let opener = self.opener.clone();
        let terminal = self.terminal.clone();

        Box::pin(async move {
            let path = request.path;
            if !request.activate {
                debug!("Background launch requested for {}", path.display());
            }

            let is_desktop_file = path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(DESKTOP_EXTENSION);

            if is_desktop_file {
                let app = parse_desktop_file(&path).ok_or_else(|| LaunchError::Unsupported(path.clone()))?;
                let mut argv = app.command_line();
                if argv.is_empty() {
                    return Err(LaunchError::NoCommand(path));
                }
                if app.terminal {
                    argv.insert(0, "-e".to_string());
                    argv.insert(0, terminal);
                }

                info!("Launching {} ({})", app.name, argv.join(" "));
                Command::new(&argv[0])
                    .args(&argv[1..])
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .spawn()?;
                return Ok(());
            }

            info!("Opening {} with {}", path.display(), opener);
            let status = Command::new(&opener)
                .arg(&path)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await?;

            if status.success() {
                Ok(())
            } else {
                Err(LaunchError::Failed(status))
            }
        })
    }
}
