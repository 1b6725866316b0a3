//! Normalized service status
//!
//! systemd reports four raw fields; they collapse into one token:
//!
//! ```text
//! LoadState != loaded        -> LoadState    (not-found, bad-setting, error, masked)
//! FreezerState != running    -> FreezerState (freezing, frozen)
//! ActiveState in {inactive, failed} -> ActiveState
//! SubState == exited         -> finished
//! otherwise                  -> SubState     (running, listening, auto-restart, ...)
//! ```
//!
//! An absent (or empty) field at any step leaves the state unknown.
//! Docker's `State.Status` is used verbatim.

use std::fmt;

/// Which backend a service record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    Systemd,
    Dockerd,
    Compose,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Systemd => "systemd",
            Self::Dockerd => "dockerd",
            Self::Compose => "compose",
        }
    }

    pub fn is_docker(&self) -> bool {
        matches!(self, Self::Dockerd | Self::Compose)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single status token shared by both backends
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum State {
    // systemd load failures
    NotFound,
    BadSetting,
    Error,
    Masked,
    // systemd freezer
    Freezing,
    Frozen,
    Thawing,
    // systemd active/sub states
    Inactive,
    Failed,
    Finished,
    Listening,
    AutoRestart,
    StartPre,
    Start,
    StartPost,
    Reload,
    StopPre,
    Stop,
    StopPost,
    // docker
    Created,
    Restarting,
    Removing,
    Paused,
    Exited,
    Dead,
    // both
    Running,
    /// Anything outside the known sets, kept verbatim
    Other(String),
}

impl State {
    pub fn parse(s: &str) -> Self {
        match s {
            "not-found" => Self::NotFound,
            "bad-setting" => Self::BadSetting,
            "error" => Self::Error,
            "masked" => Self::Masked,
            "freezing" => Self::Freezing,
            "frozen" => Self::Frozen,
            "thawing" => Self::Thawing,
            "inactive" => Self::Inactive,
            "failed" => Self::Failed,
            "finished" => Self::Finished,
            "listening" => Self::Listening,
            "auto-restart" => Self::AutoRestart,
            "start-pre" => Self::StartPre,
            "start" => Self::Start,
            "start-post" => Self::StartPost,
            "reload" => Self::Reload,
            "stop-pre" => Self::StopPre,
            "stop" => Self::Stop,
            "stop-post" => Self::StopPost,
            "created" => Self::Created,
            "restarting" => Self::Restarting,
            "removing" => Self::Removing,
            "paused" => Self::Paused,
            "exited" => Self::Exited,
            "dead" => Self::Dead,
            "running" => Self::Running,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::NotFound => "not-found",
            Self::BadSetting => "bad-setting",
            Self::Error => "error",
            Self::Masked => "masked",
            Self::Freezing => "freezing",
            Self::Frozen => "frozen",
            Self::Thawing => "thawing",
            Self::Inactive => "inactive",
            Self::Failed => "failed",
            Self::Finished => "finished",
            Self::Listening => "listening",
            Self::AutoRestart => "auto-restart",
            Self::StartPre => "start-pre",
            Self::Start => "start",
            Self::StartPost => "start-post",
            Self::Reload => "reload",
            Self::StopPre => "stop-pre",
            Self::Stop => "stop",
            Self::StopPost => "stop-post",
            Self::Created => "created",
            Self::Restarting => "restarting",
            Self::Removing => "removing",
            Self::Paused => "paused",
            Self::Exited => "exited",
            Self::Dead => "dead",
            Self::Running => "running",
            Self::Other(s) => s,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collapse systemd's LoadState, FreezerState, ActiveState and SubState
pub fn composite_state(
    load: Option<&str>,
    freezer: Option<&str>,
    active: Option<&str>,
    sub: Option<&str>,
) -> Option<State> {
    let load = present(load)?;
    if load != "loaded" {
        return Some(State::parse(load));
    }
    let freezer = present(freezer)?;
    if freezer != "running" {
        return Some(State::parse(freezer));
    }
    let active = present(active)?;
    if matches!(active, "inactive" | "failed") {
        return Some(State::parse(active));
    }
    match present(sub)? {
        "exited" => Some(State::Finished),
        sub => Some(State::parse(sub)),
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_state_table() {
        let cases: &[(Option<&str>, Option<&str>, Option<&str>, Option<&str>, Option<State>)] = &[
            (None, Some("running"), Some("active"), Some("running"), None),
            (Some(""), Some("running"), Some("active"), Some("running"), None),
            (Some("not-found"), None, None, None, Some(State::NotFound)),
            (Some("not-found"), Some("running"), Some("active"), Some("running"), Some(State::NotFound)),
            (Some("masked"), Some("running"), Some("inactive"), Some("dead"), Some(State::Masked)),
            (Some("bad-setting"), None, None, None, Some(State::BadSetting)),
            (Some("loaded"), None, Some("active"), Some("running"), None),
            (Some("loaded"), Some("frozen"), None, None, Some(State::Frozen)),
            (Some("loaded"), Some("freezing"), Some("active"), Some("running"), Some(State::Freezing)),
            (Some("loaded"), Some("running"), None, Some("running"), None),
            (Some("loaded"), Some("running"), Some("inactive"), Some("dead"), Some(State::Inactive)),
            (Some("loaded"), Some("running"), Some("failed"), Some("failed"), Some(State::Failed)),
            (Some("loaded"), Some("running"), Some("active"), None, None),
            (Some("loaded"), Some("running"), Some("active"), Some("exited"), Some(State::Finished)),
            (Some("loaded"), Some("running"), Some("active"), Some("running"), Some(State::Running)),
            (Some("loaded"), Some("running"), Some("active"), Some("listening"), Some(State::Listening)),
            (Some("loaded"), Some("running"), Some("activating"), Some("auto-restart"), Some(State::AutoRestart)),
            (Some("loaded"), Some("running"), Some("activating"), Some("start-pre"), Some(State::StartPre)),
            (Some("loaded"), Some("running"), Some("deactivating"), Some("stop"), Some(State::Stop)),
        ];

        for (load, freezer, active, sub, expected) in cases {
            assert_eq!(
                composite_state(*load, *freezer, *active, *sub),
                *expected,
                "load={:?} freezer={:?} active={:?} sub={:?}",
                load,
                freezer,
                active,
                sub
            );
        }
    }

    #[test]
    fn test_state_parse_round_trip() {
        for token in ["not-found", "frozen", "finished", "auto-restart", "exited", "running", "paused"] {
            assert_eq!(State::parse(token).as_str(), token);
        }
    }

    #[test]
    fn test_unknown_state_kept_verbatim() {
        let state = State::parse("condition");
        assert_eq!(state, State::Other("condition".to_string()));
        assert_eq!(state.to_string(), "condition");
    }

    #[test]
    fn test_origin_as_str() {
        assert_eq!(Origin::Systemd.as_str(), "systemd");
        assert_eq!(Origin::Dockerd.as_str(), "dockerd");
        assert_eq!(Origin::Compose.as_str(), "compose");
        assert!(Origin::Compose.is_docker());
        assert!(!Origin::Systemd.is_docker());
    }
}
