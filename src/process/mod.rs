//! Subprocess invocation
//!
//! Every backend lookup goes through the [`Runner`] trait so discovery code
//! can be driven by canned output in tests.

mod live;

pub use live::{run_live, tail, LIVE_WINDOW};

use std::collections::HashMap;
use std::process::Command;

use serde::de::DeserializeOwned;

/// Errors raised while talking to a backend executable
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("cannot invoke '{program}': {source}")]
    Unavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unexpected output from {what}: {reason}")]
    Parse { what: String, reason: String },

    #[error("'{command}' exited with {}: {stderr}", exit_status(.code))]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("no live container for {target}")]
    NoContainer { target: String },
}

fn exit_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

impl BackendError {
    pub fn parse(what: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            what: what.into(),
            reason: reason.into(),
        }
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Output {
    /// Exit code, `None` if the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl Output {
    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Turn a non-zero exit into [`BackendError::Failed`]
    pub fn check(self, argv: &[&str]) -> Result<Self, BackendError> {
        if self.success() {
            return Ok(self);
        }
        Err(BackendError::Failed {
            command: argv.join(" "),
            code: self.code,
            stderr: self.stderr.trim().to_string(),
        })
    }

    /// Stdout split into lines, surrounding newlines stripped
    pub fn lines(&self) -> Vec<&str> {
        let trimmed = self.stdout.trim_matches(|c| c == '\n' || c == '\r');
        if trimmed.is_empty() {
            return Vec::new();
        }
        trimmed.lines().collect()
    }

    /// Stdout decoded as a single JSON document
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(self.stdout.trim())
    }

    /// Stdout decoded as one JSON document per non-empty line
    pub fn json_lines<T: DeserializeOwned>(&self) -> Result<Vec<T>, serde_json::Error> {
        self.lines()
            .into_iter()
            .filter(|l| !l.trim().is_empty())
            .map(serde_json::from_str)
            .collect()
    }
}

/// Executes commands on behalf of the discovery code
pub trait Runner {
    fn run(&self, argv: &[&str]) -> Result<Output, BackendError>;
}

/// Runs commands directly (no shell) with `std::process::Command`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn run(&self, argv: &[&str]) -> Result<Output, BackendError> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| BackendError::parse("command line", "empty argv"))?;

        let out = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| BackendError::Unavailable {
                program: program.to_string(),
                source,
            })?;

        let output = Output {
            code: out.status.code(),
            stdout: String::from_utf8_lossy(&out.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&out.stderr).into_owned(),
        };

        log::debug!("shell command    : {}", argv.join(" "));
        log::debug!("shell stdout     : {}", output.stdout.trim());
        log::debug!("shell stderr     : {}", output.stderr.trim());
        log::debug!("shell return code: {:?}", output.code);

        Ok(output)
    }
}

/// Replays canned outputs keyed by the full command line
///
/// Commands without a script fail as if the program did not exist, which is
/// what a host without docker or systemd looks like.
#[derive(Debug, Default, Clone)]
pub struct ScriptedRunner {
    scripts: HashMap<String, Output>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the output for a command line such as `"docker ps --all"`
    pub fn on(mut self, command_line: &str, output: Output) -> Self {
        self.scripts.insert(command_line.to_string(), output);
        self
    }
}

impl Runner for ScriptedRunner {
    fn run(&self, argv: &[&str]) -> Result<Output, BackendError> {
        let line = argv.join(" ");
        match self.scripts.get(&line) {
            Some(output) => Ok(output.clone()),
            None => Err(BackendError::Unavailable {
                program: argv.first().copied().unwrap_or_default().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, line),
            }),
        }
    }
}

/// Split a shell-style command line into argv
pub fn split_command(line: &str) -> Result<Vec<String>, BackendError> {
    let parts = shlex::split(line)
        .ok_or_else(|| BackendError::parse("command line", format!("invalid quoting in: {}", line)))?;
    if parts.is_empty() {
        return Err(BackendError::parse("command line", "empty command"));
    }
    Ok(parts)
}
