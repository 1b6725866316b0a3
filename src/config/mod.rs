//! Stack definition file
//!
//! Path lookup order:
//! 1. `--config PATH` from the command line
//! 2. the `COMPOSE_STACK_CONFIG` environment variable
//! 3. `~/compose-stack.yaml`

mod yaml;

pub use yaml::{expand_tilde, read_yaml};

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

pub const CONFIG_ENV: &str = "COMPOSE_STACK_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "~/compose-stack.yaml";

pub const TEMPLATE: &str = r#"# compose-stack.yaml

services:
    systemd:
        - nginx
        - ssh
    compose:
        website:
            path: ~/website/compose.yaml
        smarthome:
            path: /opt/smarthome/compose.yaml
        nextcloud:
            ignored: true
"#;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot find configuration file '{}'", .0.display())]
    NotFound(PathBuf),

    #[error("Cannot read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML in '{}': {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Cannot find compose file '{}' for project '{project}'", .path.display())]
    ComposeNotFound { project: String, path: PathBuf },

    #[error("Cannot include from '{}': {reason}", .path.display())]
    Include { path: PathBuf, reason: String },
}

/// A compose project declared in the stack definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeProject {
    pub name: String,
    pub file_path: PathBuf,
    pub ignored: bool,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    services: Option<ServicesSection>,
}

#[derive(Debug, Default, Deserialize)]
struct ServicesSection {
    systemd: Option<UnitNames>,
    compose: Option<Mapping>,
}

/// `systemd:` accepts a list of names or a mapping keyed by name
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UnitNames {
    List(Vec<String>),
    Map(Mapping),
}

#[derive(Debug, Default, Deserialize)]
struct ComposeEntry {
    path: Option<PathBuf>,
    #[serde(default)]
    ignored: bool,
}

/// Parsed stack definition
#[derive(Debug, Clone)]
pub struct Config {
    path: PathBuf,
    raw: Value,
    systemd_units: Vec<String>,
    compose_projects: Vec<ComposeProject>,
}

impl Config {
    /// Locate and load the stack definition
    pub fn load(cli_path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let path = resolve_path(cli_path, env_path.as_deref());
        Self::from_file(&path)
    }

    /// Load the stack definition at exactly `path`
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let path = absolute(&expand_tilde(path));
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }

        let raw = read_yaml(&path)?;
        let file: ConfigFile = if raw.is_null() {
            ConfigFile::default()
        } else {
            serde_yaml::from_value(raw.clone()).map_err(|source| ConfigError::Yaml {
                path: path.clone(),
                source,
            })?
        };

        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let section = file.services.unwrap_or_default();
        let systemd_units = unit_names(section.systemd);
        let compose_projects = compose_projects(&path, &root, section.compose.unwrap_or_default())?;

        log::debug!("loaded config from path {}", path.display());

        Ok(Self {
            path,
            raw,
            systemd_units,
            compose_projects,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the config file; relative compose paths start here
    pub fn root_path(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("/"))
    }

    /// Declared systemd units, `.service` suffix stripped
    pub fn systemd_unit_names(&self) -> &[String] {
        &self.systemd_units
    }

    /// Declared compose projects in file order
    pub fn compose_projects(&self) -> &[ComposeProject] {
        &self.compose_projects
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_yaml::to_string(&self.raw).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

/// Pick the config path from the CLI value, the environment, or the default
pub fn resolve_path(cli_path: Option<&Path>, env_path: Option<&Path>) -> PathBuf {
    let chosen = cli_path
        .or(env_path)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    absolute(&expand_tilde(&chosen))
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

fn unit_names(section: Option<UnitNames>) -> Vec<String> {
    let names: Vec<String> = match section {
        None => Vec::new(),
        Some(UnitNames::List(names)) => names,
        Some(UnitNames::Map(map)) => map
            .iter()
            .filter_map(|(k, _)| k.as_str().map(str::to_string))
            .collect(),
    };
    names
        .into_iter()
        .map(|n| n.strip_suffix(".service").map(str::to_string).unwrap_or(n))
        .collect()
}

fn compose_projects(
    config_path: &Path,
    root: &Path,
    section: Mapping,
) -> Result<Vec<ComposeProject>, ConfigError> {
    let mut projects = Vec::new();
    for (key, value) in section {
        let Some(name) = key.as_str().map(str::to_string) else {
            log::warn!("ignoring compose project with non-string name {:?}", key);
            continue;
        };
        let entry: ComposeEntry = if value.is_null() {
            ComposeEntry::default()
        } else {
            serde_yaml::from_value(value).map_err(|source| ConfigError::Yaml {
                path: config_path.to_path_buf(),
                source,
            })?
        };

        let relative = entry
            .path
            .unwrap_or_else(|| Path::new("services").join(&name).join("compose.yml"));
        // join keeps absolute paths as they are
        let file_path = root.join(expand_tilde(&relative));

        projects.push(ComposeProject {
            name,
            file_path,
            ignored: entry.ignored,
        });
    }
    Ok(projects)
}
