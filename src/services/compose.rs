//! Declared services from compose files

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use super::docker::push_port;
use super::service::Service;
use super::state::Origin;
use crate::config::{read_yaml, ComposeProject, ConfigError};

#[derive(Debug, Default, Deserialize)]
struct ComposeFile {
    #[serde(default)]
    services: Option<Mapping>,
}

#[derive(Debug, Default, Deserialize)]
struct ComposeService {
    image: Option<String>,
    #[serde(default)]
    ports: Vec<PortSpec>,
}

/// Short (`"8080:80/tcp"`, `80`) or long (`target`/`published`) port syntax
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PortSpec {
    Short(String),
    Number(u64),
    Long {
        target: Value,
        published: Option<Value>,
        protocol: Option<String>,
    },
}

/// One placeholder per service in the project's compose file
pub fn compose_placeholders(project: &ComposeProject) -> Result<Vec<Service>, ConfigError> {
    let path = &project.file_path;
    if !path.exists() {
        return Err(ConfigError::ComposeNotFound {
            project: project.name.clone(),
            path: path.clone(),
        });
    }

    let raw = read_yaml(path)?;
    if raw.is_null() {
        return Ok(Vec::new());
    }
    let yaml_error = |source| ConfigError::Yaml {
        path: path.clone(),
        source,
    };
    let file: ComposeFile = serde_yaml::from_value(raw).map_err(yaml_error)?;

    let mut services = Vec::new();
    for (key, value) in file.services.unwrap_or_default() {
        let Some(name) = key.as_str() else {
            log::warn!("ignoring compose service with non-string name {:?} in {}", key, path.display());
            continue;
        };
        let declared: ComposeService = if value.is_null() {
            ComposeService::default()
        } else {
            serde_yaml::from_value(value).map_err(yaml_error)?
        };

        let mut service = Service::placeholder(Origin::Compose, project.name.as_str(), name);
        service.image_name = declared.image;
        for port in &declared.ports {
            let (host, container) = port.split();
            push_port(&mut service, host.as_deref(), &container);
        }
        services.push(service);
    }
    Ok(services)
}

impl PortSpec {
    /// `(host port, container port)`; a leading bind address is dropped
    fn split(&self) -> (Option<String>, String) {
        match self {
            PortSpec::Short(spec) => {
                let spec = spec.strip_prefix("0.0.0.0:").unwrap_or(spec);
                let mut parts = spec.rsplitn(3, ':');
                let container = parts.next().unwrap_or_default().to_string();
                let host = parts.next().filter(|h| !h.is_empty()).map(str::to_string);
                (host, container)
            }
            PortSpec::Number(port) => (None, port.to_string()),
            PortSpec::Long {
                target,
                published,
                protocol,
            } => {
                let mut container = scalar_text(target).unwrap_or_default();
                if let Some(protocol) = protocol {
                    container = format!("{}/{}", container, protocol);
                }
                (published.as_ref().and_then(scalar_text), container)
            }
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
