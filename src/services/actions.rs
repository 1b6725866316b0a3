//! Stop and restart through the owning backend

use super::service::Service;
use crate::process::{run_live, BackendError, LIVE_WINDOW};

impl Service {
    /// Id of the container backing this record
    ///
    /// Declared services that were never created have none. They must not be
    /// addressed by name, docker would resolve that to any container carrying it.
    pub fn container_id(&self) -> Result<&str, BackendError> {
        self.pid().ok_or_else(|| BackendError::NoContainer {
            target: format!("{}/{}", self.stack, self.name),
        })
    }

    /// Handle passed to the backend: container id, or the unit file name
    fn backend_target(&self) -> Result<String, BackendError> {
        if self.origin.is_docker() {
            self.container_id().map(str::to_string)
        } else {
            Ok(format!("{}.service", self.name))
        }
    }

    /// Command line that stops this service
    pub fn stop_command(&self) -> Result<Vec<String>, BackendError> {
        self.action_command("stop")
    }

    /// Command line that restarts this service
    pub fn restart_command(&self) -> Result<Vec<String>, BackendError> {
        self.action_command("restart")
    }

    fn action_command(&self, verb: &str) -> Result<Vec<String>, BackendError> {
        let program = if self.origin.is_docker() { "docker" } else { "systemctl" };
        Ok(vec![program.to_string(), verb.to_string(), self.backend_target()?])
    }
}

/// Stop the service, tailing the backend's output; `true` on success
pub fn stop(service: &Service) -> Result<bool, BackendError> {
    let argv = service.stop_command()?;
    log::info!("stopping {}", service);
    execute(&argv)
}

/// Restart the service unless it is not running and `force` is unset
///
/// Returns `Ok(None)` when the restart was refused.
pub fn restart(service: &Service, force: bool) -> Result<Option<bool>, BackendError> {
    if !force && !service.is_running() {
        log::warn!("ignoring {} which is not running, use --force to restart anyway", service);
        return Ok(None);
    }
    let argv = service.restart_command()?;
    log::info!("{}restarting {}", if force { "force " } else { "" }, service);
    execute(&argv).map(Some)
}

fn execute(argv: &[String]) -> Result<bool, BackendError> {
    let argv: Vec<&str> = argv.iter().map(String::as_str).collect();
    let output = run_live(&argv, LIVE_WINDOW)?;
    if !output.success() {
        log::error!("'{}' failed: {}", argv.join(" "), output.stderr.trim());
    }
    Ok(output.success())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{Origin, Stack, State};

    #[test]
    fn test_systemd_commands() {
        let s = Service::new(Origin::Systemd, "systemd", "nginx");
        assert_eq!(s.stop_command().unwrap(), vec!["systemctl", "stop", "nginx.service"]);
        assert_eq!(s.restart_command().unwrap(), vec!["systemctl", "restart", "nginx.service"]);
    }

    #[test]
    fn test_docker_commands_use_container_id() {
        let mut s = Service::new(Origin::Compose, "web", "app");
        s.process_id = Some("4f2a9c1be07d".to_string());
        assert_eq!(s.stop_command().unwrap(), vec!["docker", "stop", "4f2a9c1be07d"]);
        assert_eq!(s.restart_command().unwrap(), vec!["docker", "restart", "4f2a9c1be07d"]);
    }

    #[test]
    fn test_declared_service_without_container_is_refused() {
        let mut bare = Service::new(Origin::Dockerd, "dockerd", "app");
        bare.process_id = Some("ffff00001111".to_string());
        let mut stack = Stack::new();
        stack.add(Service::new(Origin::Compose, "web", "app"));
        stack.add(bare);

        let found = stack.find("app", Some("web"));
        assert_eq!(found.len(), 1);
        let declared = found[0];
        for err in [declared.stop_command().unwrap_err(), declared.restart_command().unwrap_err()] {
            assert!(matches!(err, BackendError::NoContainer { .. }));
            assert_eq!(err.to_string(), "no live container for web/app");
        }
        assert!(matches!(stop(declared).unwrap_err(), BackendError::NoContainer { .. }));
        assert!(matches!(restart(declared, true).unwrap_err(), BackendError::NoContainer { .. }));
    }

    #[test]
    fn test_restart_refused_when_not_running() {
        let mut s = Service::new(Origin::Systemd, "systemd", "nginx");
        s.state = Some(State::Inactive);
        assert_eq!(restart(&s, false).unwrap(), None);
    }

    #[test]
    fn test_execute_reports_exit_status() {
        let argv = |script: &str| vec!["sh".to_string(), "-c".to_string(), script.to_string()];
        assert!(execute(&argv("echo done")).unwrap());
        assert!(!execute(&argv("exit 2")).unwrap());
    }
}
