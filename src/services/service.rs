//! Normalized service record shared by systemd and docker

use std::fmt;

use chrono::NaiveDateTime;

use super::state::{Origin, State};
use crate::table::Row;

/// Rendering of every timestamp field
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Row keys in output order
pub const COLUMNS: &[&str] = &[
    "WANTED", "TYPE", "STACK", "NAME", "PID", "PID6", "STATE", "CREATED", "STARTED", "FINISHED",
    "CHANGED", "MEM", "CPU", "BLOCKIO", "NETIO", "NETPORT", "NETMAP", "NETMODE", "MOUNTS", "IMAGE",
    "IMAGEID", "IMAGEID6", "IMAGEVER", "IMAGEDATE",
];

/// One systemd unit or docker container
///
/// Fields a backend cannot provide stay `None` (or empty for the port lists).
#[derive(Debug, Clone)]
pub struct Service {
    /// Declared in the stack definition
    pub wanted: bool,
    pub origin: Origin,
    /// `systemd`, `dockerd`, or the compose project name
    pub stack: String,
    /// Unit name or compose service name
    pub name: String,

    /// Main PID (systemd) or container id (docker)
    pub process_id: Option<String>,
    pub process_id_short: Option<String>,

    pub state: Option<State>,
    pub created_at: Option<NaiveDateTime>,
    pub started_at: Option<NaiveDateTime>,
    pub finished_at: Option<NaiveDateTime>,
    pub changed_at: Option<NaiveDateTime>,

    pub memory_usage: Option<String>,
    pub cpu_usage: Option<String>,
    pub block_io: Option<String>,
    pub net_io: Option<String>,

    /// Host ports
    pub net_ports: Vec<String>,
    /// `<hostport>(<containerport>)` pairs
    pub net_port_map: Vec<String>,
    pub net_mode: Option<String>,
    /// e.g. `2V 1B`
    pub mounts: Option<String>,

    pub image_name: Option<String>,
    pub image_id: Option<String>,
    pub image_id_short: Option<String>,
    pub image_version: Option<String>,
    pub image_created_at: Option<String>,
}

impl Service {
    /// Empty live record
    pub fn new(origin: Origin, stack: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            wanted: false,
            origin,
            stack: stack.into(),
            name: name.into(),
            process_id: None,
            process_id_short: None,
            state: None,
            created_at: None,
            started_at: None,
            finished_at: None,
            changed_at: None,
            memory_usage: None,
            cpu_usage: None,
            block_io: None,
            net_io: None,
            net_ports: Vec::new(),
            net_port_map: Vec::new(),
            net_mode: None,
            mounts: None,
            image_name: None,
            image_id: None,
            image_id_short: None,
            image_version: None,
            image_created_at: None,
        }
    }

    /// Declared record with no live data
    pub fn placeholder(origin: Origin, stack: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            wanted: true,
            ..Self::new(origin, stack, name)
        }
    }

    /// Non-empty process id, if any
    pub fn pid(&self) -> Option<&str> {
        self.process_id.as_deref().filter(|p| !p.is_empty())
    }

    /// Same entity: matching process ids when both have one, otherwise
    /// matching stack and name
    pub fn same_identity(&self, other: &Service) -> bool {
        match (self.pid(), other.pid()) {
            (Some(a), Some(b)) => a == b,
            _ => self.stack == other.stack && self.name == other.name,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.as_ref().is_some_and(State::is_running)
    }

    /// Flatten into a row keyed by [`COLUMNS`]
    pub fn to_row(&self) -> Row {
        let time = |t: &Option<NaiveDateTime>| t.map(|t| t.format(TIMESTAMP_FORMAT).to_string());

        Row::new()
            .with("WANTED", self.wanted)
            .with("TYPE", self.origin.as_str())
            .with("STACK", self.stack.as_str())
            .with("NAME", self.name.as_str())
            .with("PID", self.process_id.clone())
            .with("PID6", self.process_id_short.clone())
            .with("STATE", self.state.as_ref().map(|s| s.to_string()))
            .with("CREATED", time(&self.created_at))
            .with("STARTED", time(&self.started_at))
            .with("FINISHED", time(&self.finished_at))
            .with("CHANGED", time(&self.changed_at))
            .with("MEM", self.memory_usage.clone())
            .with("CPU", self.cpu_usage.clone())
            .with("BLOCKIO", self.block_io.clone())
            .with("NETIO", self.net_io.clone())
            .with("NETPORT", self.net_ports.clone())
            .with("NETMAP", self.net_port_map.clone())
            .with("NETMODE", self.net_mode.clone())
            .with("MOUNTS", self.mounts.clone())
            .with("IMAGE", self.image_name.clone())
            .with("IMAGEID", self.image_id.clone())
            .with("IMAGEID6", self.image_id_short.clone())
            .with("IMAGEVER", self.image_version.clone())
            .with("IMAGEDATE", self.image_created_at.clone())
    }

    /// One `NAME, STACK, PARAMETER, VALUE` row per field
    pub fn details(&self) -> Vec<Row> {
        self.to_row()
            .iter()
            .filter(|(key, _)| !matches!(*key, "NAME" | "STACK"))
            .map(|(key, cell)| {
                Row::new()
                    .with("NAME", self.name.as_str())
                    .with("STACK", self.stack.as_str())
                    .with("PARAMETER", key.to_lowercase())
                    .with("VALUE", cell.clone())
            })
            .collect()
    }
}

/// Equality is identity, see [`Service::same_identity`]
impl PartialEq for Service {
    fn eq(&self, other: &Self) -> bool {
        self.same_identity(other)
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.as_ref().map_or("unknown", State::as_str);
        let changed = self
            .changed_at
            .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_else(|| "unknown".to_string());
        write!(f, "{}@{} is {} last changed {}", self.name, self.stack, state, changed)
    }
}

/// Parse `YYYY-MM-DD HH:MM:SS`
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    fn live(stack: &str, name: &str, pid: Option<&str>) -> Service {
        let mut s = Service::new(Origin::Compose, stack, name);
        s.process_id = pid.map(str::to_string);
        s
    }

    #[test]
    fn test_identity_by_process_id() {
        let a = live("web", "app", Some("abc123"));
        let b = live("other", "renamed", Some("abc123"));
        assert!(a.same_identity(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn test_identity_differs_by_process_id() {
        let a = live("web", "app", Some("abc123"));
        let b = live("web", "app", Some("def456"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_identity_falls_back_to_name() {
        let placeholder = Service::placeholder(Origin::Compose, "web", "app");
        let running = live("web", "app", Some("abc123"));
        assert_eq!(placeholder, running);
        assert_ne!(placeholder, live("web", "db", Some("abc123")));
        assert_ne!(placeholder, live("api", "app", None));
    }

    #[test]
    fn test_empty_process_id_is_absent() {
        let a = live("web", "app", Some(""));
        let b = live("web", "app", Some("abc123"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_placeholder_is_wanted_and_empty() {
        let s = Service::placeholder(Origin::Systemd, "systemd", "nginx");
        assert!(s.wanted);
        assert!(s.state.is_none());
        assert!(s.process_id.is_none());
        assert!(s.net_ports.is_empty());
    }

    #[test]
    fn test_row_uses_upper_case_columns() {
        let mut s = Service::placeholder(Origin::Systemd, "systemd", "nginx");
        s.state = Some(State::Running);
        s.started_at = parse_timestamp("2024-01-02 03:04:05");
        let row = s.to_row();

        assert_eq!(row.keys().collect::<Vec<_>>(), COLUMNS.to_vec());
        assert_eq!(row.get("WANTED"), Some(&Cell::Flag(true)));
        assert_eq!(row.text("TYPE"), Some("systemd"));
        assert_eq!(row.text("STATE"), Some("running"));
        assert_eq!(row.text("STARTED"), Some("2024-01-02 03:04:05"));
        assert_eq!(row.get("IMAGE"), Some(&Cell::Empty));
    }

    #[test]
    fn test_details_skip_identity_columns() {
        let s = Service::placeholder(Origin::Systemd, "systemd", "nginx");
        let rows = s.details();
        assert_eq!(rows.len(), COLUMNS.len() - 2);
        assert_eq!(rows[0].text("PARAMETER"), Some("wanted"));
        assert_eq!(rows[0].text("NAME"), Some("nginx"));
    }

    #[test]
    fn test_display() {
        let mut s = Service::new(Origin::Systemd, "systemd", "nginx");
        assert_eq!(s.to_string(), "nginx@systemd is unknown last changed unknown");
        s.state = Some(State::Finished);
        s.changed_at = parse_timestamp("2024-01-01 00:00:00");
        assert_eq!(s.to_string(), "nginx@systemd is finished last changed 2024-01-01 00:00:00");
    }

    #[test]
    fn test_parse_timestamp() {
        assert!(parse_timestamp("2024-01-01 12:30:00").is_some());
        assert!(parse_timestamp("0000-00-00 00:00:00").is_none());
        assert!(parse_timestamp("").is_none());
    }
}
