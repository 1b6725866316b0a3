//! Docker backend
//!
//! Containers are read from `docker inspect <id>`. Compose-managed
//! containers carry the project and service names as labels.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::Deserialize;

use super::service::{parse_timestamp, Service};
use super::state::{Origin, State};
use crate::diagnostics::Diagnostics;
use crate::process::{BackendError, Runner};

/// Stack name for containers outside any compose project
pub const DOCKERD_STACK: &str = "dockerd";

pub const LABEL_COMPOSE_PROJECT: &str = "com.docker.compose.project";
pub const LABEL_COMPOSE_SERVICE: &str = "com.docker.compose.service";
pub const LABEL_IMAGE_VERSION: &str = "org.opencontainers.image.version";
pub const LABEL_IMAGE_CREATED: &str = "org.opencontainers.image.created";

const SHORT_ID_LEN: usize = 6;

/// Subset of `docker inspect` output for a container
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerInspect {
    pub id: Option<String>,
    pub name: Option<String>,
    pub created: Option<String>,
    /// Image id; only containers have it
    pub image: Option<String>,
    pub state: Option<ContainerState>,
    pub config: Option<ContainerConfig>,
    pub network_settings: Option<NetworkSettings>,
    pub host_config: Option<HostConfig>,
    pub mounts: Option<Vec<MountPoint>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerState {
    pub status: Option<String>,
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerConfig {
    pub image: Option<String>,
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkSettings {
    /// `"80/tcp": [{"HostIp": "0.0.0.0", "HostPort": "8080"}]` or `null`
    pub ports: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HostConfig {
    pub network_mode: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MountPoint {
    #[serde(rename = "Type")]
    pub kind: Option<String>,
}

/// One line of `docker stats --no-stream --format json`
#[derive(Debug, Clone, Deserialize)]
pub struct ContainerStats {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "MemUsage")]
    pub mem_usage: Option<String>,
    #[serde(rename = "CPUPerc")]
    pub cpu_perc: Option<String>,
    #[serde(rename = "BlockIO")]
    pub block_io: Option<String>,
    #[serde(rename = "NetIO")]
    pub net_io: Option<String>,
}

impl ContainerInspect {
    fn label(&self, key: &str) -> Option<&str> {
        self.config
            .as_ref()
            .and_then(|c| c.labels.as_ref())
            .and_then(|labels| labels.get(key))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

impl Service {
    /// Snapshot one container with `docker inspect`
    pub fn from_docker(
        runner: &dyn Runner,
        diag: &dyn Diagnostics,
        container_id: &str,
    ) -> Result<Self, BackendError> {
        let output = runner.run(&["docker", "inspect", container_id])?;
        let what = format!("docker inspect {}", container_id);
        let mut items: Vec<ContainerInspect> = output
            .json()
            .map_err(|e| BackendError::parse(what.clone(), e.to_string()))?;
        if items.is_empty() {
            return Err(BackendError::parse(what, "no object returned"));
        }
        Self::from_inspect(items.swap_remove(0), container_id, diag)
    }

    /// Build from a decoded inspect object
    ///
    /// Objects without an `Image` field (images, volumes) are rejected.
    pub fn from_inspect(
        c: ContainerInspect,
        container_id: &str,
        diag: &dyn Diagnostics,
    ) -> Result<Self, BackendError> {
        let Some(image_id) = c.image.clone().filter(|i| !i.is_empty()) else {
            return Err(BackendError::parse(
                format!("docker inspect {}", container_id),
                "object is not a container",
            ));
        };

        let (origin, stack) = match c.label(LABEL_COMPOSE_PROJECT) {
            Some(project) => (Origin::Compose, project.to_string()),
            None => (Origin::Dockerd, DOCKERD_STACK.to_string()),
        };
        let name = match c.label(LABEL_COMPOSE_SERVICE) {
            Some(service) => service.to_string(),
            None => c
                .name
                .as_deref()
                .unwrap_or_default()
                .trim_start_matches('/')
                .to_string(),
        };

        let mut service = Service::new(origin, stack, name);

        let id = c
            .id
            .clone()
            .filter(|i| !i.is_empty())
            .unwrap_or_else(|| container_id.to_string());
        service.process_id_short = Some(short_id(&id));
        service.process_id = Some(id);

        let state = c.state.as_ref();
        service.state = state
            .and_then(|s| s.status.as_deref())
            .filter(|s| !s.is_empty())
            .map(State::parse);
        service.created_at = docker_timestamp(c.created.as_deref(), "Created", diag);
        service.started_at =
            docker_timestamp(state.and_then(|s| s.started_at.as_deref()), "StartedAt", diag);
        service.finished_at =
            docker_timestamp(state.and_then(|s| s.finished_at.as_deref()), "FinishedAt", diag);
        service.changed_at = [service.created_at, service.started_at, service.finished_at]
            .into_iter()
            .flatten()
            .max();

        if let Some(ports) = c.network_settings.as_ref().and_then(|n| n.ports.as_ref()) {
            for (container_port, bindings) in ports {
                let host_port = bindings
                    .as_array()
                    .and_then(|b| b.first())
                    .and_then(|b| b.get("HostPort"))
                    .and_then(|p| p.as_str())
                    .filter(|p| !p.is_empty());
                push_port(&mut service, host_port, container_port);
            }
        }

        service.net_mode = c
            .host_config
            .as_ref()
            .and_then(|h| h.network_mode.clone())
            .filter(|m| !m.is_empty());
        service.mounts = format_mounts(c.mounts.as_deref().unwrap_or_default());

        service.image_name = c.config.as_ref().and_then(|cfg| cfg.image.clone());
        service.image_id_short = Some(short_id(image_id.trim_start_matches("sha256:")));
        service.image_id = Some(image_id);
        service.image_version = c.label(LABEL_IMAGE_VERSION).map(str::to_string);
        service.image_created_at = c.label(LABEL_IMAGE_CREATED).map(str::to_string);

        Ok(service)
    }

    /// Fold `docker stats` figures into a docker-origin record
    pub fn with_stats(mut self, stats: &ContainerStats) -> Self {
        self.memory_usage = stats
            .mem_usage
            .as_deref()
            .and_then(|m| m.split(" / ").next())
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
        self.cpu_usage = stats.cpu_perc.clone().filter(|v| !v.is_empty());
        self.block_io = stats.block_io.clone().filter(|v| !v.is_empty());
        self.net_io = stats.net_io.clone().filter(|v| !v.is_empty());
        self
    }
}

/// Record one exposed port: `host(container)` in the map, host port in the
/// port list when bound
pub(crate) fn push_port(service: &mut Service, host_port: Option<&str>, container_port: &str) {
    match host_port {
        Some(host) => {
            service.net_ports.push(host.to_string());
            service.net_port_map.push(format!("{}({})", host, container_port));
        }
        None => service.net_port_map.push(format!("({})", container_port)),
    }
}

/// Container ids, optionally scoped to one compose file
pub fn list_containers(
    runner: &dyn Runner,
    compose_file: Option<&Path>,
) -> Result<Vec<String>, BackendError> {
    let file = compose_file.map(|f| f.to_string_lossy().into_owned());
    let argv: Vec<&str> = match &file {
        Some(file) => vec!["docker", "compose", "-f", file.as_str(), "ps", "--all", "--format", "{{.ID}}"],
        None => vec!["docker", "ps", "--all", "--format", "{{.ID}}"],
    };
    let output = runner.run(&argv)?.check(&argv)?;
    Ok(output
        .lines()
        .into_iter()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect())
}

/// Live resource figures for running containers
pub fn docker_stats(runner: &dyn Runner) -> Result<Vec<ContainerStats>, BackendError> {
    let output = runner.run(&["docker", "stats", "--no-stream", "--format", "json"])?;
    output
        .json_lines()
        .map_err(|e| BackendError::parse("docker stats", e.to_string()))
}

/// First 19 chars of an ISO-8601 string with `T` replaced by a space
pub fn simplify_timestamp(text: &str) -> String {
    text.chars().take(19).collect::<String>().replace('T', " ")
}

fn docker_timestamp(raw: Option<&str>, key: &str, diag: &dyn Diagnostics) -> Option<NaiveDateTime> {
    let raw = raw.filter(|r| !r.is_empty())?;
    let parsed = parse_timestamp(&simplify_timestamp(raw));
    if parsed.is_none() {
        diag.debug(&format!("cannot parse {} timestamp '{}'", key, raw));
    }
    parsed
}

/// `<v>V <b>B`, zero counts omitted; `None` without mounts
pub fn format_mounts(mounts: &[MountPoint]) -> Option<String> {
    let count = |kind: &str| {
        mounts
            .iter()
            .filter(|m| m.kind.as_deref() == Some(kind))
            .count()
    };
    let volumes = count("volume");
    let binds = count("bind");

    let mut parts = Vec::new();
    if volumes > 0 {
        parts.push(format!("{}V", volumes));
    }
    if binds > 0 {
        parts.push(format!("{}B", binds));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

fn short_id(id: &str) -> String {
    id.chars().take(SHORT_ID_LEN).collect()
}
