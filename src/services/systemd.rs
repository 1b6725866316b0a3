//! systemd backend
//!
//! Reads `systemctl show <unit>` (one `Key=Value` property per line) and
//! `systemctl list-units` (whitespace columns, unit name first).

use std::collections::HashMap;

use chrono::NaiveDateTime;

use super::service::Service;
use super::state::{composite_state, Origin};
use crate::diagnostics::Diagnostics;
use crate::process::{BackendError, Runner};

/// Stack name for every systemd unit
pub const SYSTEMD_STACK: &str = "systemd";

pub const LIST_UNITS: &[&str] = &[
    "systemctl",
    "list-units",
    "--type=service",
    "--all",
    "--no-pager",
    "--plain",
    "--no-legend",
];

/// systemd prints this for unlimited/unknown counters
const UNSET_COUNTER: u64 = u64::MAX;

impl Service {
    /// Snapshot one unit with `systemctl show`
    pub fn from_systemd(
        runner: &dyn Runner,
        diag: &dyn Diagnostics,
        unit: &str,
    ) -> Result<Self, BackendError> {
        let output = runner.run(&["systemctl", "show", unit])?;
        Self::from_systemctl_show(&output.stdout, unit, diag)
    }

    /// Build from the text of `systemctl show`
    ///
    /// Units that do not exist still produce properties (LoadState=not-found).
    pub fn from_systemctl_show(
        text: &str,
        unit: &str,
        diag: &dyn Diagnostics,
    ) -> Result<Self, BackendError> {
        let props = parse_properties(text)?;
        let get = |key: &str| props.get(key).map(String::as_str);

        let name = get("Id")
            .filter(|id| !id.is_empty())
            .unwrap_or(unit);
        let name = name.strip_suffix(".service").unwrap_or(name);

        let mut service = Service::new(Origin::Systemd, SYSTEMD_STACK, name);
        // ExecMainPID=0 means no main process
        service.process_id = get("ExecMainPID")
            .filter(|pid| !pid.is_empty() && *pid != "0")
            .map(str::to_string);
        service.state = composite_state(
            get("LoadState"),
            get("FreezerState"),
            get("ActiveState"),
            get("SubState"),
        );
        service.started_at = timestamp_field(&props, "ExecMainStartTimestamp", diag);
        service.changed_at = timestamp_field(&props, "StateChangeTimestamp", diag);
        service.memory_usage = get("MemoryCurrent").and_then(format_memory);
        service.cpu_usage = get("CPUUsageNSec").and_then(format_cpu_time);

        Ok(service)
    }
}

/// Split `Key=Value` lines on the first `=`
pub fn parse_properties(text: &str) -> Result<HashMap<String, String>, BackendError> {
    let mut props = HashMap::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| BackendError::parse("systemctl show", format!("malformed line '{}'", line)))?;
        props.insert(key.to_string(), value.to_string());
    }
    Ok(props)
}

/// Unit names known to systemd, `.service` stripped
pub fn list_units(runner: &dyn Runner) -> Result<Vec<String>, BackendError> {
    let output = runner.run(LIST_UNITS)?.check(LIST_UNITS)?;
    Ok(output
        .lines()
        .into_iter()
        .filter_map(|line| line.split_whitespace().next())
        .map(|unit| unit.strip_suffix(".service").unwrap_or(unit).to_string())
        .collect())
}

fn timestamp_field(
    props: &HashMap<String, String>,
    key: &str,
    diag: &dyn Diagnostics,
) -> Option<NaiveDateTime> {
    let raw = props.get(key).map(String::as_str).unwrap_or_default();
    if raw.is_empty() {
        return None;
    }
    let parsed = parse_systemd_timestamp(raw);
    if parsed.is_none() {
        diag.debug(&format!("cannot parse {} timestamp '{}'", key, raw));
    }
    parsed
}

/// Parse `<weekday> YYYY-MM-DD HH:MM:SS [<tz>]`
pub fn parse_systemd_timestamp(text: &str) -> Option<NaiveDateTime> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if !(3..=4).contains(&tokens.len()) {
        return None;
    }
    NaiveDateTime::parse_from_str(&tokens[..3].join(" "), "%a %Y-%m-%d %H:%M:%S").ok()
}

/// Bytes to gigabytes with one decimal, e.g. `1.5G`
pub fn format_memory(bytes: &str) -> Option<String> {
    let bytes: u64 = bytes.trim().parse().ok()?;
    if bytes == UNSET_COUNTER {
        return None;
    }
    let gigabytes = (bytes as f64 / 1024f64.powi(3) * 10.0).round() / 10.0;
    if gigabytes == 0.0 {
        return None;
    }
    Some(format!("{:.1}G", gigabytes))
}

/// Nanoseconds to `<H>h <M>m <S.s>s`, zero segments omitted
///
/// The seconds segment is kept when it is the only one.
pub fn format_cpu_time(nanoseconds: &str) -> Option<String> {
    let nanoseconds: u64 = nanoseconds.trim().parse().ok()?;
    if nanoseconds == UNSET_COUNTER {
        return None;
    }
    // tenths of a second, rounded before splitting so 59.96s carries over
    let tenths = (nanoseconds as f64 / 1e8).round() as u64;
    let hours = tenths / 36_000;
    let minutes = (tenths % 36_000) / 600;
    let seconds = (tenths % 600) as f64 / 10.0;

    let mut segments = Vec::new();
    if hours > 0 {
        segments.push(format!("{}h", hours));
    }
    if minutes > 0 {
        segments.push(format!("{}m", minutes));
    }
    if seconds > 0.0 || segments.is_empty() {
        segments.push(format!("{:.1}s", seconds));
    }
    Some(segments.join(" "))
}
