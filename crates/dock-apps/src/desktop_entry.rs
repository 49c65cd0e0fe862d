//! Desktop entry parsing.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Parsed from .desktop files.
#[derive(Clone, Debug)]
pub struct DesktopApp {
    pub name: String,
    pub exec: Option<String>,
    pub icon_name: Option<String>,
    pub terminal: bool,
    pub no_display: bool,
    pub hidden: bool,
    pub desktop_file_path: PathBuf,
}

impl DesktopApp {
    /// Whether the entry asks not to be shown in menus.
    pub fn is_hidden(&self) -> bool {
        self.no_display || self.hidden
    }

    /// The `Exec` command line split into arguments, with field codes removed.
    pub fn command_line(&self) -> Vec<String> {
        self.exec
            .as_deref()
            .map(|exec| expand_exec(exec, self))
            .unwrap_or_default()
    }
}

/// Parse a .desktop file into a DesktopApp struct.
/// Returns None for anything that is not a launchable `Type=Application` entry.
pub fn parse_desktop_file(path: &Path) -> Option<DesktopApp> {
    let content = fs::read_to_string(path).ok()?;
    parse_desktop_entry(&content, path)
}

/// Parse the text of a desktop entry; `path` is recorded as its origin.
pub fn parse_desktop_entry(content: &str, path: &Path) -> Option<DesktopApp> {
    let mut entries = HashMap::new();
    let mut in_desktop_entry = false;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            in_desktop_entry = line == "[Desktop Entry]";
            continue;
        }

        if in_desktop_entry {
            if let Some((key, value)) = line.split_once('=') {
                // Localized keys (Name[de]=...) are ignored; first plain key wins.
                entries
                    .entry(key.trim().to_string())
                    .or_insert_with(|| value.trim().to_string());
            }
        }
    }

    if entries.get("Type").map(|s| s.as_str()) != Some("Application") {
        return None;
    }

    let name = entries.get("Name")?.clone();
    let flag = |key: &str| entries.get(key).map(|s| s == "true").unwrap_or(false);

    Some(DesktopApp {
        name,
        exec: entries.get("Exec").cloned(),
        icon_name: entries.get("Icon").cloned(),
        terminal: flag("Terminal"),
        no_display: flag("NoDisplay"),
        hidden: flag("Hidden"),
        desktop_file_path: path.to_path_buf(),
    })
}

/// Split an `Exec` value into arguments and expand field codes.
///
/// File and URL codes (`%f %F %u %U`) expand to nothing because the launcher
/// never passes documents. `%c` becomes the name, `%k` the desktop file path,
/// `%i` the `--icon <name>` pair, `%%` a literal percent sign.
fn expand_exec(exec: &str, app: &DesktopApp) -> Vec<String> {
    let mut args = Vec::new();

    for token in tokenize(exec) {
        match token.as_str() {
            "%f" | "%F" | "%u" | "%U" | "%d" | "%D" | "%n" | "%N" | "%v" | "%m" => {}
            "%c" => args.push(app.name.clone()),
            "%k" => args.push(app.desktop_file_path.to_string_lossy().to_string()),
            "%i" => {
                if let Some(icon) = &app.icon_name {
                    args.push("--icon".to_string());
                    args.push(icon.clone());
                }
            }
            _ => {
                let arg = strip_inline_codes(&token);
                if !arg.is_empty() {
                    args.push(arg);
                }
            }
        }
    }

    args
}

fn strip_inline_codes(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c == '%' {
            match chars.next() {
                Some('%') => out.push('%'),
                Some(_) | None => {}
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Quote-aware whitespace split following the desktop entry quoting rules.
fn tokenize(exec: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;
    let mut chars = exec.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            '\\' if in_quotes => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }

    if has_token {
        tokens.push(current);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Option<DesktopApp> {
        parse_desktop_entry(content, Path::new("/usr/share/applications/test.desktop"))
    }

    #[test]
    fn test_parse_application_entry() {
        let app = parse(
            "[Desktop Entry]\nType=Application\nName=Mail\nName[fr]=Courrier\nExec=mail --new %U\nIcon=mail\n",
        )
        .unwrap();

        assert_eq!(app.name, "Mail");
        assert_eq!(app.icon_name.as_deref(), Some("mail"));
        assert!(!app.is_hidden());
        assert_eq!(app.command_line(), vec!["mail", "--new"]);
    }

    #[test]
    fn test_non_application_types_are_rejected() {
        assert!(parse("[Desktop Entry]\nType=Link\nName=Docs\nURL=https://example.com\n").is_none());
        assert!(parse("[Desktop Entry]\nName=NoType\n").is_none());
    }

    #[test]
    fn test_keys_outside_desktop_entry_group_are_ignored() {
        let app = parse(
            "[Desktop Action new]\nName=New Window\n[Desktop Entry]\nType=Application\nName=Browser\nExec=browser\n",
        )
        .unwrap();
        assert_eq!(app.name, "Browser");
    }

    #[test]
    fn test_hidden_flags() {
        let no_display = parse("[Desktop Entry]\nType=Application\nName=A\nNoDisplay=true\n").unwrap();
        let hidden = parse("[Desktop Entry]\nType=Application\nName=B\nHidden=true\n").unwrap();
        assert!(no_display.is_hidden());
        assert!(hidden.is_hidden());
    }

    #[test]
    fn test_exec_quoting_and_field_codes() {
        let app = parse(
            "[Desktop Entry]\nType=Application\nName=Edit Pro\nIcon=edit\nExec=\"/opt/edit pro/bin\" --title %c %i --ratio 100%% %f\n",
        )
        .unwrap();

        assert_eq!(
            app.command_line(),
            vec![
                "/opt/edit pro/bin",
                "--title",
                "Edit Pro",
                "--icon",
                "edit",
                "--ratio",
                "100%",
            ]
        );
    }

    #[test]
    fn test_missing_exec_yields_empty_command() {
        let app = parse("[Desktop Entry]\nType=Application\nName=Ghost\n").unwrap();
        assert!(app.command_line().is_empty());
    }
}
