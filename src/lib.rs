//! compose-stack - one inventory for systemd units and Docker Compose stacks
//!
//! A YAML stack definition declares the systemd units and compose projects
//! a host should run. The declared services are reconciled with what
//! `systemctl` and `docker` report, so a single table shows both.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────┐
//! │                    cs (binary)                    │
//! ├───────────────────────────────────────────────────┤
//! │  Config  │        Stack         │  Table renderer  │
//! ├───────────────────────────────────────────────────┤
//! │  compose files │ docker inspect │ systemctl show   │
//! ├───────────────────────────────────────────────────┤
//! │            Runner (subprocess, live tail)          │
//! └───────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod console;
pub mod diagnostics;
pub mod inventory;
pub mod logging;
pub mod process;
pub mod services;
pub mod table;

pub use config::{Config, ConfigError};
pub use diagnostics::{Diagnostics, LogDiagnostics, RecordingDiagnostics};
pub use process::{BackendError, Output, Runner, ScriptedRunner, SystemRunner};
pub use services::{Origin, Service, Stack, State};
pub use table::{print_table, Cell, Row, TableOptions};
