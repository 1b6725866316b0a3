//! Log output for the `cs` binary
//!
//! Lines look like `[ℹ️   INFO    ]: message`. Debug lines carry the source
//! location and a local timestamp.

use std::io::{IsTerminal, Write};

use chrono::{Local, NaiveDateTime};
use log::{Level, LevelFilter};

use crate::console;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Install the global logger; `RUST_LOG` overrides `verbosity`
pub fn init(verbosity: u8) {
    let filter = level_filter(verbosity);
    let color = std::io::stderr().is_terminal();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter.as_str()))
        .format(move |buf, record| {
            let location = record.file().zip(record.line());
            let line = format_line(
                record.level(),
                &record.args().to_string(),
                location,
                color,
                Local::now().naive_local(),
            );
            writeln!(buf, "{}", line)
        })
        .init();
}

/// Count of `-v` flags to a level: none shows only errors
pub fn level_filter(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Error,
        1 => LevelFilter::Warn,
        2 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

fn emoji(level: Level) -> &'static str {
    match level {
        Level::Error => "❌",
        Level::Warn => "⚠️ ",
        Level::Info => "ℹ️ ",
        Level::Debug | Level::Trace => "🛠️ ",
    }
}

fn color(level: Level) -> Option<&'static str> {
    match level {
        Level::Error => Some(console::RED),
        Level::Warn => Some(console::YELLOW),
        Level::Info => Some(console::CYAN),
        Level::Debug | Level::Trace => None,
    }
}

pub fn format_line(
    level: Level,
    message: &str,
    location: Option<(&str, u32)>,
    use_color: bool,
    now: NaiveDateTime,
) -> String {
    let name = format!("{:<8}", level.as_str());
    let name = match color(level).filter(|_| use_color) {
        Some(code) => format!("{}{}{}", code, name, console::RESET),
        None => name,
    };
    let mut line = format!("[{}  {}]: {}", emoji(level), name, message);

    if level >= Level::Debug {
        let (file, lineno) = location.unwrap_or(("?", 0));
        line.push_str(&format!(" @[{}#{} {}]", file, lineno, now.format(TIME_FORMAT)));
    }
    line
}
