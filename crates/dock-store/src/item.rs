//! Pinned item model.

use crate::error::ResolutionError;
use crate::locator::{Locator, Resolved};
use dock_apps::CatalogEntry;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user-selected reference to an application.
///
/// Persisted as `{ "id", "displayName", "locatorToken" }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinnedItem {
    id: Uuid,
    display_name: String,
    #[serde(rename = "locatorToken")]
    locator: Locator,
}

impl PinnedItem {
    /// New item with a fresh id.
    pub fn new(display_name: impl Into<String>, locator: Locator) -> Self {
        Self {
            id: Uuid::new_v4(),
            display_name: display_name.into(),
            locator,
        }
    }

    /// Pin a catalog entry, capturing a locator for its live path.
    pub fn pin(entry: &CatalogEntry) -> Result<Self, ResolutionError> {
        let locator = Locator::capture(&entry.path)?;
        Ok(Self::new(entry.display_name.clone(), locator))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Label captured at pin time. Not refreshed when the target is renamed.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    pub fn resolve(&self) -> Result<Resolved, ResolutionError> {
        self.locator.resolve()
    }
}
