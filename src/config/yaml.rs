//! YAML loading with `!include` support

use std::path::{Path, PathBuf};

use serde_yaml::Value;

use super::ConfigError;

const MAX_INCLUDE_DEPTH: usize = 16;

/// Read a YAML file, replacing `!include <path>` nodes with the referenced
/// document (resolved relative to the including file)
pub fn read_yaml(path: &Path) -> Result<Value, ConfigError> {
    read_yaml_at_depth(path, 0)
}

fn read_yaml_at_depth(path: &Path, depth: usize) -> Result<Value, ConfigError> {
    if depth > MAX_INCLUDE_DEPTH {
        return Err(ConfigError::Include {
            path: path.to_path_buf(),
            reason: format!("nested deeper than {} levels", MAX_INCLUDE_DEPTH),
        });
    }

    log::info!("parsing YAML from file {}", path.display());
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut value: Value = serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;

    let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
    resolve_includes(&mut value, &base, depth)?;
    log::debug!("parsed YAML content as {:?}", value);
    Ok(value)
}

fn resolve_includes(value: &mut Value, base: &Path, depth: usize) -> Result<(), ConfigError> {
    match value {
        Value::Tagged(tagged) if tagged.tag == "include" => {
            let target = match &tagged.value {
                Value::String(s) => base.join(s),
                other => {
                    return Err(ConfigError::Include {
                        path: base.to_path_buf(),
                        reason: format!("expected a file name, got {:?}", other),
                    })
                }
            };
            *value = read_yaml_at_depth(&target, depth + 1)?;
        }
        Value::Tagged(tagged) => resolve_includes(&mut tagged.value, base, depth)?,
        Value::Mapping(map) => {
            for (_, v) in map.iter_mut() {
                resolve_includes(v, base, depth)?;
            }
        }
        Value::Sequence(seq) => {
            for v in seq.iter_mut() {
                resolve_includes(v, base, depth)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Expand a leading `~` to the home directory
pub fn expand_tilde(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_read_yaml_basic() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("config.yml");
        fs::write(&file, "name: Alice\nage: 30\n").unwrap();

        let value = read_yaml(&file).unwrap();
        assert_eq!(value["name"], Value::from("Alice"));
        assert_eq!(value["age"], Value::from(30));
    }

    #[test]
    fn test_read_yaml_with_include() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("included.yml"), "job: engineer\n").unwrap();
        let main = dir.path().join("main.yml");
        fs::write(&main, "person: !include included.yml\n").unwrap();

        let value = read_yaml(&main).unwrap();
        assert_eq!(value["person"]["job"], Value::from("engineer"));
    }

    #[test]
    fn test_read_yaml_nested_include_in_sequence() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/leaf.yml"), "- a\n- b\n").unwrap();
        fs::write(dir.path().join("sub/mid.yml"), "items: !include leaf.yml\n").unwrap();
        let main = dir.path().join("main.yml");
        fs::write(&main, "list:\n  - !include sub/mid.yml\n").unwrap();

        let value = read_yaml(&main).unwrap();
        assert_eq!(value["list"][0]["items"][1], Value::from("b"));
    }

    #[test]
    fn test_read_yaml_include_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let main = dir.path().join("loop.yml");
        fs::write(&main, "again: !include loop.yml\n").unwrap();

        let err = read_yaml(&main).unwrap_err();
        assert!(matches!(err, ConfigError::Include { .. }));
    }

    #[test]
    fn test_read_yaml_missing_file() {
        let err = read_yaml(Path::new("/nonexistent/compose-stack.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_read_yaml_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bad.yml");
        fs::write(&file, "this: [unclosed\n").unwrap();

        let err = read_yaml(&file).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde(Path::new("/etc/x")), PathBuf::from("/etc/x"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde(Path::new("~/a.yml")), home.join("a.yml"));
        }
    }
}
