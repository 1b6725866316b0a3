//! Service records and their reconciliation
//!
//! A [`Stack`] is seeded with placeholders from the stack definition and
//! then refreshed from docker and systemd. Records for the same entity merge
//! (see [`Service::same_identity`]).

mod actions;
mod compose;
mod docker;
mod service;
mod stack;
mod state;
mod systemd;

pub use actions::{restart, stop};
pub use compose::compose_placeholders;
pub use docker::{
    docker_stats, format_mounts, list_containers, simplify_timestamp, ContainerInspect,
    ContainerStats, MountPoint, DOCKERD_STACK,
};
pub use service::{parse_timestamp, Service, COLUMNS, TIMESTAMP_FORMAT};
pub use stack::Stack;
pub use state::{composite_state, Origin, State};
pub use systemd::{
    format_cpu_time, format_memory, list_units, parse_properties, parse_systemd_timestamp,
    LIST_UNITS, SYSTEMD_STACK,
};
