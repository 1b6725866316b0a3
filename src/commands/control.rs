//! Stop and restart services

use std::collections::HashSet;
use std::path::Path;

use compose_stack::services::{self, Service};
use compose_stack::{Config, LogDiagnostics, Stack, SystemRunner};

pub fn stop(config: Option<&Path>, name: &str, stack: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let service = lookup(config, name, stack)?;
    if !services::stop(&service)? {
        return Err(format!("failed to stop {}", service.name).into());
    }
    println!("stopped {}", service);
    Ok(())
}

pub fn restart(
    config: Option<&Path>,
    name: &str,
    stack: Option<&str>,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = lookup(config, name, stack)?;
    match services::restart(&service, force)? {
        None => Ok(()),
        Some(true) => {
            println!("restarted {}", service);
            Ok(())
        }
        Some(false) => Err(format!("failed to restart {}", service.name).into()),
    }
}

/// The single live service named `name`
fn lookup(config: Option<&Path>, name: &str, stack_name: Option<&str>) -> Result<Service, Box<dyn std::error::Error>> {
    let config = Config::load(config)?;
    let runner = SystemRunner;
    let diag = LogDiagnostics;

    let mut stack = Stack::new();
    stack.seed_from_config(&config)?;
    stack.refresh_from_dockerd(&runner, &diag, None, false);
    let units: HashSet<String> = config.systemd_unit_names().iter().cloned().collect();
    stack.refresh_from_systemd(&runner, &diag, Some(&units));

    let matches = stack.find(name, stack_name);
    match matches.as_slice() {
        [] => Err(format!("cannot find service named '{}'", name).into()),
        [service] => {
            if service.origin.is_docker() {
                service.container_id()?;
            }
            Ok((*service).clone())
        }
        many => {
            let stacks: Vec<&str> = many.iter().map(|s| s.stack.as_str()).collect();
            Err(format!(
                "service '{}' exists in several stacks ({}), pick one with --stack",
                name,
                stacks.join(", ")
            )
            .into())
        }
    }
}
