//! Reconciled collection of declared and live services

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use super::compose::compose_placeholders;
use super::docker::{docker_stats, list_containers};
use super::service::Service;
use super::state::Origin;
use super::systemd::{list_units, SYSTEMD_STACK};
use crate::config::{Config, ConfigError};
use crate::diagnostics::Diagnostics;
use crate::process::{BackendError, Runner};
use crate::table::Row;

/// Insertion-ordered services, at most one per identity
#[derive(Debug, Clone, Default)]
pub struct Stack {
    services: Vec<Service>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or merge with full replacement
    pub fn add(&mut self, service: Service) {
        self.merge(service, true);
    }

    /// Insert `service`, or merge it into the entry with the same identity
    ///
    /// `wanted` becomes the OR of both. With `replace` every other field is
    /// taken from `service`; without it the existing fields stay.
    pub fn merge(&mut self, service: Service, replace: bool) {
        match self.services.iter_mut().find(|s| s.same_identity(&service)) {
            Some(existing) => {
                let wanted = existing.wanted || service.wanted;
                if replace {
                    *existing = service;
                }
                existing.wanted = wanted;
            }
            None => self.services.push(service),
        }
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn contains(&self, service: &Service) -> bool {
        self.services.iter().any(|s| s.same_identity(service))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Service> {
        self.services.iter()
    }

    /// First service with this name
    pub fn get(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.name == name)
    }

    /// Every service with this name, optionally restricted to one stack
    pub fn find(&self, name: &str, stack: Option<&str>) -> Vec<&Service> {
        self.services
            .iter()
            .filter(|s| s.name == name && stack.map_or(true, |st| s.stack == st))
            .collect()
    }

    /// Add placeholders for every declared unit and compose service
    ///
    /// Ignored compose projects are skipped. A compose file that cannot be
    /// found or parsed is fatal.
    pub fn seed_from_config(&mut self, config: &Config) -> Result<(), ConfigError> {
        for unit in config.systemd_unit_names() {
            self.add(Service::placeholder(Origin::Systemd, SYSTEMD_STACK, unit.as_str()));
        }
        for project in config.compose_projects() {
            if project.ignored {
                log::debug!("skipping ignored compose project {}", project.name);
                continue;
            }
            for service in compose_placeholders(project)? {
                self.add(service);
            }
        }
        Ok(())
    }

    /// Merge one live record per docker container
    ///
    /// With `compose_file` only that project's containers are listed. With
    /// `stats` the live resource figures are folded in.
    pub fn refresh_from_dockerd(
        &mut self,
        runner: &dyn Runner,
        diag: &dyn Diagnostics,
        compose_file: Option<&Path>,
        stats: bool,
    ) {
        let ids = match list_containers(runner, compose_file) {
            Ok(ids) => ids,
            Err(e) => {
                report_listing_failure(diag, "docker containers", &e);
                return;
            }
        };

        let stats = if stats {
            docker_stats(runner).unwrap_or_else(|e| {
                diag.warn(&format!("cannot collect docker stats: {}", e));
                Vec::new()
            })
        } else {
            Vec::new()
        };

        for id in ids {
            match Service::from_docker(runner, diag, &id) {
                Ok(mut service) => {
                    let entry = service
                        .pid()
                        .and_then(|pid| stats.iter().find(|st| !st.id.is_empty() && pid.starts_with(&st.id)));
                    if let Some(entry) = entry {
                        service = service.with_stats(entry);
                    }
                    self.add(service);
                }
                Err(e) => diag.error(&format!("skipping container {}: {}", id, e)),
            }
        }
    }

    /// Merge one live record per systemd service unit
    ///
    /// With `filter` only the named units are inspected and they are marked
    /// wanted.
    pub fn refresh_from_systemd(
        &mut self,
        runner: &dyn Runner,
        diag: &dyn Diagnostics,
        filter: Option<&HashSet<String>>,
    ) {
        let units = match list_units(runner) {
            Ok(units) => units,
            Err(e) => {
                report_listing_failure(diag, "systemd units", &e);
                return;
            }
        };

        for unit in units {
            if filter.is_some_and(|f| !f.contains(&unit)) {
                continue;
            }
            match Service::from_systemd(runner, diag, &unit) {
                Ok(mut service) => {
                    service.wanted = filter.is_some();
                    self.add(service);
                }
                Err(e) => diag.error(&format!("skipping unit {}: {}", unit, e)),
            }
        }
    }

    /// One row per service, see [`Service::to_row`]
    pub fn to_rows(&self) -> Vec<Row> {
        self.services.iter().map(Service::to_row).collect()
    }
}

/// A backend that ran but exited non-zero is a warning, anything else an error
fn report_listing_failure(diag: &dyn Diagnostics, what: &str, err: &BackendError) {
    let message = format!("cannot list {}: {}", what, err);
    match err {
        BackendError::Failed { .. } => diag.warn(&message),
        _ => diag.error(&message),
    }
}

impl<'a> IntoIterator for &'a Stack {
    type Item = &'a Service;
    type IntoIter = std::slice::Iter<'a, Service>;

    fn into_iter(self) -> Self::IntoIter {
        self.services.iter()
    }
}

impl fmt::Display for Stack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Stack with {} services>", self.services.len())
    }
}
