//! The dock panel: interactive front-end over the stores.
//!
//! Lives on the interactive thread. Every `UiEvent` is handled here and
//! only here, so the stores are never touched from anywhere else.

pub mod commands;
pub mod render;

use crate::event_bus::{LaunchResult, UiEvent};
use crate::services;
use commands::{Command, HELP, Setting, Target};
use crossbeam_channel::Sender;
use dock_apps::{CatalogEntry, CatalogScanner, Launcher, filter_entries};
use dock_store::events::drain;
use dock_store::{PersistenceGateway, PinnedItemStore, SettingsStore, StoreEvent, ToggleOutcome};
use log::{debug, info};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::broadcast::Receiver;

/// Collaborators of the panel.
pub struct DockContext {
    pub gateway: Arc<PersistenceGateway>,
    pub scanner: CatalogScanner,
    pub launcher: Arc<dyn Launcher>,
    pub runtime: Handle,
    pub tx: Sender<UiEvent>,
    pub launch_timeout: Duration,
}

pub struct DockPanel {
    items: PinnedItemStore,
    settings: SettingsStore,
    store_rx: Receiver<StoreEvent>,
    catalog: Option<Vec<CatalogEntry>>,
    scan_in_flight: bool,
    rescan_queued: bool,
    /// Commands waiting for the first catalog scan.
    deferred: VecDeque<Command>,
    launches_in_flight: usize,
    quit_requested: bool,
    visible: bool,
    ctx: DockContext,
}

impl DockPanel {
    /// Hydrate both stores before anything is shown.
    pub fn new(ctx: DockContext) -> Self {
        let events = dock_store::events::channel();
        let store_rx = events.subscribe();
        let items = PinnedItemStore::load(ctx.gateway.clone(), events.clone());
        let settings = SettingsStore::load(ctx.gateway.clone(), events);

        Self {
            items,
            settings,
            store_rx,
            catalog: None,
            scan_in_flight: false,
            rescan_queued: false,
            deferred: VecDeque::new(),
            launches_in_flight: 0,
            quit_requested: false,
            visible: true,
            ctx,
        }
    }

    pub fn items(&self) -> &PinnedItemStore {
        &self.items
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Done once quit was asked for and nothing is left in flight.
    pub fn should_exit(&self) -> bool {
        self.quit_requested && self.deferred.is_empty() && self.launches_in_flight == 0
    }

    /// Start a background scan, or queue one if a scan is running.
    pub fn request_scan(&mut self) {
        if self.scan_in_flight {
            self.rescan_queued = true;
            return;
        }
        self.scan_in_flight = true;
        services::apps::start_scan(self.ctx.scanner.clone(), self.ctx.tx.clone());
    }

    /// Apply one event; returns the lines to show the user.
    pub fn handle(&mut self, event: UiEvent) -> Vec<String> {
        let mut out = match event {
            UiEvent::Command(line) => match Command::parse(&line) {
                Ok(Some(command)) => self.dispatch(command),
                Ok(None) => Vec::new(),
                Err(e) => vec![e],
            },
            UiEvent::CatalogLoaded(entries) => self.on_catalog(entries),
            UiEvent::CatalogChanged => {
                debug!("Catalog sources changed, rescanning");
                self.request_scan();
                Vec::new()
            }
            UiEvent::LaunchFinished { name, result } => self.on_launch_finished(name, result),
            UiEvent::InputClosed => {
                self.quit();
                Vec::new()
            }
        };

        for event in drain(&mut self.store_rx) {
            if let StoreEvent::PersistFailed { key } = event {
                out.push(format!("warning: could not save {}", key));
            }
        }

        out
    }

    fn dispatch(&mut self, command: Command) -> Vec<String> {
        if command.needs_catalog() && self.catalog.is_none() {
            self.deferred.push_back(command);
            if !self.scan_in_flight {
                self.request_scan();
            }
            return vec!["Scanning applications...".to_string()];
        }
        self.run(command)
    }

    fn on_catalog(&mut self, entries: Vec<CatalogEntry>) -> Vec<String> {
        info!("Catalog loaded with {} apps", entries.len());
        self.catalog = Some(entries);
        self.scan_in_flight = false;

        if self.rescan_queued {
            self.rescan_queued = false;
            self.request_scan();
        }

        let mut out = Vec::new();
        while let Some(command) = self.deferred.pop_front() {
            out.extend(self.run(command));
        }
        out
    }

    fn on_launch_finished(&mut self, name: String, result: LaunchResult) -> Vec<String> {
        self.launches_in_flight = self.launches_in_flight.saturating_sub(1);
        let mut out = match result {
            LaunchResult::Acknowledged => vec![format!("Opened {}", name)],
            LaunchResult::Failed(e) => vec![format!("Could not open {}: {}", name, e)],
            LaunchResult::TimedOut => vec![format!("{} did not answer in time", name)],
        };

        if self.visible {
            self.visible = false;
            out.push("(dock hidden)".to_string());
        }
        out
    }

    fn quit(&mut self) {
        self.quit_requested = true;
        let _ = self.settings.save();
    }

    fn run(&mut self, command: Command) -> Vec<String> {
        self.visible = true;

        match command {
            Command::List => render::render_items(self.items.items(), self.settings.preferences()),
            Command::Apps(query) => {
                let catalog = self.catalog.as_deref().unwrap_or_default();
                let items = &self.items;
                render::render_catalog(filter_entries(catalog, &query), |entry| {
                    items.is_pinned(entry)
                })
            }
            Command::Toggle(name) => self.toggle(&name),
            Command::Remove(target) => self.remove(target),
            Command::Move { from, to } => {
                let len = self.items.len();
                if from >= len || to >= len {
                    return vec![format!("positions go from 1 to {}", len)];
                }
                self.items.reorder(from, to);
                render::render_items(self.items.items(), self.settings.preferences())
            }
            Command::Launch(index) => self.launch(index),
            Command::Settings => render::render_preferences(self.settings.preferences()),
            Command::Set(setting) => {
                self.apply_setting(setting);
                render::render_preferences(self.settings.preferences())
            }
            Command::Rescan => {
                self.request_scan();
                vec!["Rescanning applications...".to_string()]
            }
            Command::Help => HELP.lines().map(String::from).collect(),
            Command::Quit => {
                self.quit();
                Vec::new()
            }
        }
    }

    fn find_entry(&self, name: &str) -> Option<CatalogEntry> {
        let catalog = self.catalog.as_deref()?;
        catalog
            .iter()
            .find(|e| e.display_name == name)
            .or_else(|| {
                let mut folded = catalog
                    .iter()
                    .filter(|e| e.display_name.eq_ignore_ascii_case(name));
                match (folded.next(), folded.next()) {
                    (Some(only), None) => Some(only),
                    _ => None,
                }
            })
            .cloned()
    }

    fn toggle(&mut self, name: &str) -> Vec<String> {
        let Some(entry) = self.find_entry(name) else {
            return vec![format!("No installed app named '{}'", name)];
        };

        match self.items.toggle(&entry) {
            ToggleOutcome::Pinned(_) => vec![format!("Pinned {}", entry.display_name)],
            ToggleOutcome::Unpinned(_) => vec![format!("Unpinned {}", entry.display_name)],
            ToggleOutcome::Skipped(e) => vec![format!("Could not pin {}: {}", entry.display_name, e)],
        }
    }

    fn remove(&mut self, target: Target) -> Vec<String> {
        let id = match target {
            Target::Id(id) => id,
            Target::Index(index) => match self.items.items().get(index) {
                Some(item) => item.id(),
                None => return vec![format!("No pinned app at position {}", index + 1)],
            },
        };

        let name = self.items.get(id).map(|i| i.display_name().to_string());
        if self.items.remove(id) {
            vec![format!("Removed {}", name.unwrap_or_default())]
        } else {
            vec![format!("No pinned app with id {}", id)]
        }
    }

    fn launch(&mut self, index: usize) -> Vec<String> {
        let Some(item) = self.items.items().get(index).cloned() else {
            return vec![format!("No pinned app at position {}", index + 1)];
        };

        match self.items.launch(&item, self.ctx.launcher.as_ref()) {
            Some(ack) => {
                self.launches_in_flight += 1;
                services::launch::spawn_launch(
                    &self.ctx.runtime,
                    item.display_name().to_string(),
                    ack,
                    self.ctx.launch_timeout,
                    self.ctx.tx.clone(),
                );
                vec![format!("Launching {}...", item.display_name())]
            }
            None => vec![format!("{} is no longer available", item.display_name())],
        }
    }

    fn apply_setting(&mut self, setting: Setting) {
        match setting {
            Setting::IconSize(size) => self.settings.update(|p| p.icon_size = size),
            Setting::TextSize(size) => self.settings.update(|p| p.text_size = size),
            Setting::ListLayout(list) => self.settings.update(|p| p.use_list_layout = list),
            Setting::Theme(theme) => self.settings.update(|p| p.theme = theme),
            Setting::Window { width, height } => self.settings.set_last_window_size(width, height),
        }
    }
}
