//! Text commands understood by the dock panel.
//!
//! Item numbers are 1-based as displayed; they are converted to indices here
//! and bounds-checked against the live collection by the panel.

use dock_store::{Theme, clamp_icon_size, clamp_text_size};
use uuid::Uuid;

pub const HELP: &str = "\
commands:
  list                     show pinned apps
  apps [query]             show installed apps ([x] = pinned)
  toggle <name>            pin or unpin an installed app
  remove <number|id>       unpin by position or id
  move <from> <to>         move a pinned app
  launch <number>          open a pinned app
  settings                 show display preferences
  set icon-size <32-128>
  set text-size <8-24>
  set layout <list|grid>
  set theme <system|light|dark>
  set window <width>x<height>
  rescan                   rescan installed apps
  help
  quit";

/// Which pinned item a command refers to.
#[derive(Clone, Debug, PartialEq)]
pub enum Target {
    Index(usize),
    Id(Uuid),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Setting {
    IconSize(f64),
    TextSize(f64),
    ListLayout(bool),
    Theme(Theme),
    Window { width: f64, height: f64 },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    List,
    Apps(String),
    Toggle(String),
    Remove(Target),
    Move { from: usize, to: usize },
    Launch(usize),
    Settings,
    Set(Setting),
    Rescan,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines are `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word {
            "" => return Ok(None),
            "list" | "ls" => Command::List,
            "apps" => Command::Apps(rest.to_string()),
            "toggle" | "pin" => Command::Toggle(required(rest, "toggle <name>")?.to_string()),
            "remove" | "rm" => Command::Remove(parse_target(required(rest, "remove <number|id>")?)?),
            "move" | "mv" => {
                let mut args = rest.split_whitespace();
                let (Some(from), Some(to), None) = (args.next(), args.next(), args.next()) else {
                    return Err("usage: move <from> <to>".to_string());
                };
                Command::Move {
                    from: parse_number(from)?,
                    to: parse_number(to)?,
                }
            }
            "launch" | "open" => Command::Launch(parse_number(required(rest, "launch <number>")?)?),
            "settings" => Command::Settings,
            "set" => Command::Set(parse_setting(rest)?),
            "rescan" => Command::Rescan,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("unknown command '{}', try 'help'", other)),
        };

        Ok(Some(command))
    }

    /// Whether the command needs the installed app list.
    pub fn needs_catalog(&self) -> bool {
        matches!(self, Command::Apps(_) | Command::Toggle(_))
    }
}

fn required<'a>(rest: &'a str, usage: &str) -> Result<&'a str, String> {
    if rest.is_empty() {
        Err(format!("usage: {}", usage))
    } else {
        Ok(rest)
    }
}

/// 1-based position to 0-based index.
fn parse_number(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(format!("'{}' is not an item number", raw)),
    }
}

fn parse_target(raw: &str) -> Result<Target, String> {
    if let Ok(id) = Uuid::parse_str(raw) {
        return Ok(Target::Id(id));
    }
    parse_number(raw).map(Target::Index)
}

fn parse_size(raw: &str) -> Result<f64, String> {
    raw.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| format!("'{}' is not a number", raw))
}

fn parse_setting(rest: &str) -> Result<Setting, String> {
    let (key, value) = rest
        .split_once(char::is_whitespace)
        .map(|(k, v)| (k, v.trim()))
        .ok_or_else(|| "usage: set <key> <value>".to_string())?;

    match key {
        "icon-size" => Ok(Setting::IconSize(clamp_icon_size(parse_size(value)?))),
        "text-size" => Ok(Setting::TextSize(clamp_text_size(parse_size(value)?))),
        "layout" => match value {
            "list" => Ok(Setting::ListLayout(true)),
            "grid" => Ok(Setting::ListLayout(false)),
            _ => Err("layout is 'list' or 'grid'".to_string()),
        },
        "theme" => Theme::parse(value)
            .map(Setting::Theme)
            .ok_or_else(|| "theme is 'system', 'light' or 'dark'".to_string()),
        "window" => {
            let (w, h) = value
                .split_once('x')
                .ok_or_else(|| "usage: set window <width>x<height>".to_string())?;
            let (width, height) = (parse_size(w)?, parse_size(h)?);
            if width <= 0.0 || height <= 0.0 {
                return Err("window size must be positive".to_string());
            }
            Ok(Setting::Window { width, height })
        }
        other => Err(format!("unknown setting '{}'", other)),
    }
}
