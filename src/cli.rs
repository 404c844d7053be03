//! Line commands and plain-text rendering for the terminal front end.

use chrono::{Days, NaiveDate};
use skycast_ui::SessionState;
use skycast_weather::{WeatherCondition, WeatherRecord};

pub const HELP: &str = "\
Commands:
  search <text>   filter the city list
  pick <n>        show the n-th suggestion
  select <city>   show a city by name
  open <n>        show the n-th saved city
  save            save the shown city
  remove          remove the shown city
  close           close the detail view
  list            list saved cities
  show            show the detail view again
  help            this text
  quit            exit";

const LOAD_ERROR: &str = "Unable to load weather data. Select the city to retry.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),
    Pick(usize),
    Select(String),
    Open(usize),
    Save,
    Remove,
    Close,
    List,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command: {0} (try `help`)")]
    Unknown(String),
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),
    #[error("Not a list position: {0}")]
    InvalidIndex(String),
}

impl Command {
    /// Parse one input line. Blank lines parse to `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let command = match verb.to_lowercase().as_str() {
            // An empty search clears the suggestions
            "search" | "s" => Command::Search(rest.to_string()),
            "pick" | "p" => Command::Pick(parse_index(rest, "pick")?),
            "select" => {
                if rest.is_empty() {
                    return Err(CommandError::MissingArgument("select"));
                }
                Command::Select(rest.to_string())
            }
            "open" | "o" => Command::Open(parse_index(rest, "open")?),
            "save" | "add" => Command::Save,
            "remove" | "rm" => Command::Remove,
            "close" => Command::Close,
            "list" | "ls" => Command::List,
            "show" => Command::Show,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };

        Ok(Some(command))
    }
}

/// 1-based list position to 0-based index
fn parse_index(arg: &str, verb: &'static str) -> Result<usize, CommandError> {
    if arg.is_empty() {
        return Err(CommandError::MissingArgument(verb));
    }
    match arg.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(CommandError::InvalidIndex(arg.to_string())),
    }
}

/// Weekday label for the forecast entry at `index` (0 is tomorrow)
pub fn forecast_label(today: NaiveDate, index: usize) -> String {
    today
        .checked_add_days(Days::new(index as u64 + 1))
        .map(|d| d.format("%a").to_string())
        .unwrap_or_default()
}

fn icon(record: Option<&WeatherRecord>) -> &'static str {
    record
        .map(WeatherRecord::condition)
        .unwrap_or_default()
        .icon_name()
}

fn reading(value: Option<&skycast_weather::Reading>) -> String {
    value.map(|r| r.to_string()).unwrap_or_else(|| "--".to_string())
}

pub fn render_suggestions(session: &SessionState) -> String {
    let suggestions = session.visible_suggestions();
    if suggestions.is_empty() {
        return "  (no matches)".to_string();
    }
    suggestions
        .iter()
        .enumerate()
        .map(|(i, city)| format!("  {}. {}", i + 1, city))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_saved(session: &SessionState) -> String {
    let entries = session.saved_entries();
    if entries.is_empty() {
        return "You have no cities saved.".to_string();
    }
    entries
        .into_iter()
        .enumerate()
        .map(|(i, (city, record))| {
            format!(
                "  {}. [{}] {}  {}",
                i + 1,
                icon(record),
                city,
                reading(record.and_then(|r| r.temperature.as_ref()))
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_detail(session: &SessionState, today: NaiveDate) -> String {
    let Some(city) = session.selected() else {
        return "No city selected.".to_string();
    };
    if !session.is_dialog_open() {
        return format!("{city} (closed, `show` to reopen)");
    }

    let mut lines = vec![format!("== {city} ==")];

    if session.has_error() {
        lines.push(LOAD_ERROR.to_string());
    } else if session.is_loading() {
        lines.push("Fetching data...".to_string());
    } else if let Some(record) = session.selected_record() {
        lines.push(format!(
            "[{}] {}  {}",
            icon(Some(record)),
            reading(record.temperature.as_ref()),
            record.description
        ));
        lines.push(format!(
            "[{}] Wind: {}",
            WeatherCondition::Windy.icon_name(),
            reading(record.wind.as_ref())
        ));
        lines.push(format!("{} Day Forecast", record.forecast.len()));
        if record.forecast.is_empty() {
            lines.push("No forecast found!".to_string());
        }
        for (i, day) in record.forecast.iter().enumerate() {
            lines.push(format!(
                "  {:<4} {:>8}  {}",
                forecast_label(today, i),
                reading(day.temperature.as_ref()),
                reading(day.wind.as_ref())
            ));
        }
    }

    let mut actions = Vec::new();
    if session.can_save() {
        actions.push("`save`");
    }
    if session.can_remove() {
        actions.push("`remove`");
    }
    if !actions.is_empty() {
        lines.push(format!("Actions: {}", actions.join(", ")));
    }

    lines.join("\n")
}
