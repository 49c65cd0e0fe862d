//! FolderDock - a small launcher for pinned applications.
//!
//! The main thread is the interactive thread: it owns the stores and is the
//! only receiver of `UiEvent`s. Catalog scans, source watching, launches and
//! stdin reading happen elsewhere and report back through the event bus.
//!
//! Commands given as arguments run once (`FolderDock toggle Mail`);
//! without arguments commands are read from stdin.

mod config;
mod event_bus;
mod panels;
mod services;

use config::DockConfig;
use dock_apps::{CatalogScanner, DESKTOP_EXTENSION, DesktopLauncher};
use dock_store::{FileBackend, PersistenceGateway};
use event_bus::UiEvent;
use log::{debug, info};
use panels::dock::{DockContext, DockPanel};
use std::error::Error;
use std::io::BufRead;
use std::sync::Arc;
use std::thread;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = DockConfig::from_env();
    info!(
        "Starting FolderDock instance '{}' (state in {})",
        config.instance,
        config.state_dir.display()
    );

    let runtime = tokio::runtime::Runtime::new()?;
    let (tx, rx) = event_bus::channel();

    let gateway = Arc::new(PersistenceGateway::new(
        Arc::new(FileBackend::new(&config.state_dir)),
        config.instance.clone(),
    ));

    let mut panel = DockPanel::new(DockContext {
        gateway,
        scanner: CatalogScanner::new(config.app_dirs.clone(), DESKTOP_EXTENSION),
        launcher: Arc::new(DesktopLauncher::new()),
        runtime: runtime.handle().clone(),
        tx: tx.clone(),
        launch_timeout: config.launch_timeout,
    });

    let args: Vec<String> = std::env::args().skip(1).collect();
    let _watcher = if args.is_empty() {
        println!("FolderDock ({}). Type 'help' for commands.", config.instance);
        start_input_reader(tx.clone());
        services::apps::start_watcher(&config.app_dirs, tx.clone())
    } else {
        tx.send(UiEvent::Command(args.join(" ")))?;
        tx.send(UiEvent::InputClosed)?;
        None
    };

    info!(
        "Loaded {} pinned apps, theme {}",
        panel.items().len(),
        panel.settings().preferences().theme
    );
    panel.request_scan();

    while let Ok(first) = rx.recv() {
        for event in event_bus::drain_batch(first, &rx) {
            for line in panel.handle(event) {
                println!("{}", line);
            }
        }
        if !panel.is_visible() {
            debug!("Dock hidden until the next command");
        }

        if panel.should_exit() {
            break;
        }
    }

    info!("FolderDock exiting");
    Ok(())
}

/// Read commands from stdin on a background thread.
fn start_input_reader(tx: crossbeam_channel::Sender<UiEvent>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(UiEvent::Command(line)).is_err() {
                return;
            }
        }
        let _ = tx.send(UiEvent::InputClosed);
    });
}
