//! Docker images and volumes
//!
//! Listed by id and inspected one by one, like containers. An entry that
//! cannot be inspected is reported and skipped.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::diagnostics::Diagnostics;
use crate::process::{BackendError, Runner};
use crate::services::simplify_timestamp;
use crate::table::Row;

pub const IMAGE_COLUMNS: &[&str] = &["ID", "TAG", "VERSION", "CREATED"];
pub const VOLUME_COLUMNS: &[&str] = &["ID", "COMPOSE_PROJECT", "COMPOSE_VOLUME", "CREATED", "MOUNT_PATH"];

const LABEL_COMPOSE_PROJECT: &str = "com.docker.compose.project";
const LABEL_COMPOSE_VOLUME: &str = "com.docker.compose.volume";
const LABEL_IMAGE_VERSION: &str = "org.opencontainers.image.version";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ImageInspect {
    #[serde(default)]
    repo_tags: Vec<String>,
    created: Option<String>,
    config: Option<ImageConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ImageConfig {
    labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VolumeInspect {
    created_at: Option<String>,
    mountpoint: Option<String>,
    labels: Option<HashMap<String, String>>,
}

/// One row per local image: `ID TAG VERSION CREATED`
pub fn docker_images(runner: &dyn Runner, diag: &dyn Diagnostics) -> Result<Vec<Row>, BackendError> {
    let ids = runner.run(&["docker", "images", "--format", "{{.ID}}"])?;
    Ok(inspect_each(runner, diag, &ids.lines(), |id, image: ImageInspect| {
        let version = image
            .config
            .and_then(|c| c.labels)
            .and_then(|mut labels| labels.remove(LABEL_IMAGE_VERSION));
        Row::new()
            .with("ID", id)
            .with("TAG", image.repo_tags.into_iter().next().unwrap_or_default())
            .with("VERSION", version)
            .with("CREATED", image.created.as_deref().map(simplify_timestamp))
    }))
}

/// One row per volume: `ID COMPOSE_PROJECT COMPOSE_VOLUME CREATED MOUNT_PATH`
pub fn docker_volumes(runner: &dyn Runner, diag: &dyn Diagnostics) -> Result<Vec<Row>, BackendError> {
    let ids = runner.run(&["docker", "volume", "ls", "-q"])?;
    Ok(inspect_each(runner, diag, &ids.lines(), |id, volume: VolumeInspect| {
        let mut labels = volume.labels.unwrap_or_default();
        Row::new()
            .with("ID", id)
            .with("COMPOSE_PROJECT", labels.remove(LABEL_COMPOSE_PROJECT))
            .with("COMPOSE_VOLUME", labels.remove(LABEL_COMPOSE_VOLUME))
            .with("CREATED", volume.created_at.as_deref().map(simplify_timestamp))
            .with("MOUNT_PATH", volume.mountpoint)
    }))
}

fn inspect_each<T, F>(runner: &dyn Runner, diag: &dyn Diagnostics, ids: &[&str], to_row: F) -> Vec<Row>
where
    T: DeserializeOwned,
    F: Fn(&str, T) -> Row,
{
    let mut rows = Vec::new();
    for id in ids.iter().map(|id| id.trim()).filter(|id| !id.is_empty()) {
        match inspect_first::<T>(runner, id) {
            Ok(item) => rows.push(to_row(id, item)),
            Err(e) => diag.error(&format!("skipping {}: {}", id, e)),
        }
    }
    rows
}

fn inspect_first<T: DeserializeOwned>(runner: &dyn Runner, id: &str) -> Result<T, BackendError> {
    let what = format!("docker inspect {}", id);
    let output = runner.run(&["docker", "inspect", id])?;
    let items: Vec<T> = output
        .json()
        .map_err(|e| BackendError::parse(what.clone(), e.to_string()))?;
    items
        .into_iter()
        .next()
        .ok_or_else(|| BackendError::parse(what, "no object returned"))
}
