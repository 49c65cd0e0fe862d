//! Display preferences and their store.

use crate::error::PersistenceError;
use crate::events::{self, StoreEvent};
use crate::persistence::{PersistenceGateway, SETTINGS_KEY};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tokio::sync::broadcast::{Receiver, Sender};

/// Icon sizes the UI offers, in pixels.
pub const ICON_SIZE_RANGE: RangeInclusive<f64> = 32.0..=128.0;
/// Text sizes the UI offers, in points.
pub const TEXT_SIZE_RANGE: RangeInclusive<f64> = 8.0..=24.0;

pub const DEFAULT_ICON_SIZE: f64 = 64.0;
pub const DEFAULT_TEXT_SIZE: f64 = 12.0;

/// Clamp a user-entered icon size into `ICON_SIZE_RANGE`.
pub fn clamp_icon_size(size: f64) -> f64 {
    size.clamp(*ICON_SIZE_RANGE.start(), *ICON_SIZE_RANGE.end())
}

/// Clamp a user-entered text size into `TEXT_SIZE_RANGE`.
pub fn clamp_text_size(size: f64) -> f64 {
    size.clamp(*TEXT_SIZE_RANGE.start(), *TEXT_SIZE_RANGE.end())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::System => "system",
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Case-insensitive, so records written as "System" still load.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "system" => Some(Theme::System),
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: f64,
    pub height: f64,
}

/// User display preferences, persisted as one flat record.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayPreferences {
    pub icon_size: f64,
    pub use_list_layout: bool,
    pub text_size: f64,
    pub theme: Theme,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_window_size: Option<WindowSize>,
}

impl Default for DisplayPreferences {
    fn default() -> Self {
        Self {
            icon_size: DEFAULT_ICON_SIZE,
            use_list_layout: false,
            text_size: DEFAULT_TEXT_SIZE,
            theme: Theme::System,
            last_window_size: None,
        }
    }
}

impl DisplayPreferences {
    /// Build preferences from a stored record, field by field.
    /// Missing or mistyped fields take their default.
    pub fn from_record(record: &Value) -> Self {
        let defaults = Self::default();
        let number = |key: &str| {
            record
                .get(key)
                .and_then(Value::as_f64)
                .filter(|n| n.is_finite())
        };

        let use_list_layout = record
            .get("useListLayout")
            .or_else(|| record.get("isListView"))
            .and_then(Value::as_bool)
            .unwrap_or(defaults.use_list_layout);

        let last_window_size = record.get("lastWindowSize").and_then(|size| {
            let width = size.get("width").and_then(Value::as_f64)?;
            let height = size.get("height").and_then(Value::as_f64)?;
            (width.is_finite() && height.is_finite()).then_some(WindowSize { width, height })
        });

        Self {
            icon_size: number("iconSize").unwrap_or(defaults.icon_size),
            use_list_layout,
            text_size: number("textSize").unwrap_or(defaults.text_size),
            theme: record
                .get("theme")
                .and_then(Value::as_str)
                .and_then(Theme::parse)
                .unwrap_or(defaults.theme),
            last_window_size,
        }
    }
}

/// Owns the display preferences of this instance.
///
/// Values are stored as given; range checks belong to the input widgets.
pub struct SettingsStore {
    preferences: DisplayPreferences,
    gateway: Arc<PersistenceGateway>,
    events: Sender<StoreEvent>,
}

impl SettingsStore {
    /// Hydrate from the gateway, defaulting anything missing.
    pub fn load(gateway: Arc<PersistenceGateway>, events: Sender<StoreEvent>) -> Self {
        let preferences = gateway
            .load::<Value>(SETTINGS_KEY)
            .map(|record| DisplayPreferences::from_record(&record))
            .unwrap_or_default();

        Self {
            preferences,
            gateway,
            events,
        }
    }

    pub fn preferences(&self) -> &DisplayPreferences {
        &self.preferences
    }

    /// Apply `change`, notify, then persist the full record.
    pub fn update<F>(&mut self, change: F)
    where
        F: FnOnce(&mut DisplayPreferences),
    {
        let before = self.preferences.clone();
        change(&mut self.preferences);
        if self.preferences != before {
            events::notify(&self.events, StoreEvent::SettingsChanged);
        }
        let _ = self.save();
    }

    /// Remember the window size the user left the launcher at.
    pub fn set_last_window_size(&mut self, width: f64, height: f64) {
        self.update(|prefs| prefs.last_window_size = Some(WindowSize { width, height }));
    }

    /// Serialize the full record. Failures are also reported as events.
    pub fn save(&self) -> Result<(), PersistenceError> {
        self.gateway
            .save(SETTINGS_KEY, &self.preferences)
            .inspect_err(|e| {
                events::report_persist_failure(&self.events, self.gateway.key(SETTINGS_KEY), e)
            })
    }

    /// Re-read the stored record, discarding unsaved changes.
    pub fn reload(&mut self) {
        let fresh = Self::load(self.gateway.clone(), self.events.clone());
        if fresh.preferences != self.preferences {
            self.preferences = fresh.preferences;
            events::notify(&self.events, StoreEvent::SettingsChanged);
        }
    }

    pub fn subscribe(&self) -> Receiver<StoreEvent> {
        self.events.subscribe()
    }
}
