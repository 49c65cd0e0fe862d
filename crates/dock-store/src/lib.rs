//! dock-store: pinned items, display preferences and their persistence.
//!
//! - `Locator`: durable, revalidatable reference to an application on disk
//! - `PinnedItemStore`: ordered, uniquely named collection of pinned items
//! - `SettingsStore`: display preferences
//! - `PersistenceGateway`: JSON records in an instance-namespaced key-value store
//!
//! Stores are meant to be owned by the interactive thread; they take
//! `&mut self` for mutations and carry no locks of their own.

pub mod error;
pub mod events;
mod item;
mod locator;
pub mod persistence;
mod settings;
mod store;

pub use error::{PersistenceError, ResolutionError};
pub use events::StoreEvent;
pub use item::PinnedItem;
pub use locator::{Locator, Resolved, ScopedAccess};
pub use persistence::{
    FileBackend, ITEMS_KEY, KeyValueBackend, MemoryBackend, PersistenceGateway, SETTINGS_KEY,
};
pub use settings::{
    DisplayPreferences, ICON_SIZE_RANGE, SettingsStore, TEXT_SIZE_RANGE, Theme, WindowSize,
    clamp_icon_size, clamp_text_size,
};
pub use store::{PinnedItemStore, ToggleOutcome};
