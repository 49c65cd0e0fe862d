//! Text rendering of the pinned items, as a list or an icon grid.

use dock_apps::CatalogEntry;
use dock_store::{DisplayPreferences, PinnedItem};

/// Width assumed when no window size was saved yet.
const DEFAULT_WIDTH: f64 = 480.0;
const GRID_SPACING: f64 = 15.0;
/// Horizontal padding around each icon cell.
const CELL_PADDING: f64 = 20.0;
/// Characters per grid cell.
const CELL_CHARS: usize = 14;

/// Marker for items whose target no longer resolves.
const MISSING: &str = "?";

/// How many icons fit side by side in the saved window width.
pub fn grid_columns(prefs: &DisplayPreferences) -> usize {
    let width = prefs
        .last_window_size
        .map(|size| size.width)
        .unwrap_or(DEFAULT_WIDTH);
    let cell = prefs.icon_size.max(1.0) + CELL_PADDING + GRID_SPACING;
    (((width + GRID_SPACING) / cell).floor() as usize).max(1)
}

fn label(number: usize, item: &PinnedItem) -> String {
    let marker = if item.resolve().is_ok() { "" } else { MISSING };
    format!("{}. {}{}", number, item.display_name(), marker)
}

fn fit(text: &str, width: usize) -> String {
    let mut cell: String = text.chars().take(width).collect();
    if text.chars().count() > width {
        cell.pop();
        cell.push('…');
    }
    format!("{:<width$}", cell, width = width)
}

pub fn render_items(items: &[PinnedItem], prefs: &DisplayPreferences) -> Vec<String> {
    if items.is_empty() {
        return vec!["No apps pinned. Use 'apps' and 'toggle <name>'.".to_string()];
    }

    let labels: Vec<String> = items
        .iter()
        .enumerate()
        .map(|(i, item)| label(i + 1, item))
        .collect();

    if prefs.use_list_layout {
        return labels;
    }

    labels
        .chunks(grid_columns(prefs))
        .map(|row| {
            row.iter()
                .map(|l| fit(l, CELL_CHARS))
                .collect::<Vec<_>>()
                .join(" ")
                .trim_end()
                .to_string()
        })
        .collect()
}

/// One line per installed app, marking the pinned ones.
pub fn render_catalog<'a, I, F>(entries: I, is_pinned: F) -> Vec<String>
where
    I: IntoIterator<Item = &'a CatalogEntry>,
    F: Fn(&CatalogEntry) -> bool,
{
    let lines: Vec<String> = entries
        .into_iter()
        .map(|entry| {
            let mark = if is_pinned(entry) { "x" } else { " " };
            format!("[{}] {}", mark, entry.display_name)
        })
        .collect();

    if lines.is_empty() {
        vec!["No applications found.".to_string()]
    } else {
        lines
    }
}

pub fn render_preferences(prefs: &DisplayPreferences) -> Vec<String> {
    let window = prefs
        .last_window_size
        .map(|s| format!("{}x{}", s.width, s.height))
        .unwrap_or_else(|| "unset".to_string());

    vec![
        format!("icon-size  {}", prefs.icon_size),
        format!("text-size  {}", prefs.text_size),
        format!("layout     {}", if prefs.use_list_layout { "list" } else { "grid" }),
        format!("theme      {}", prefs.theme),
        format!("window     {}", window),
    ]
}
