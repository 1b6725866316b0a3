//! Integration tests for stack reconciliation
//!
//! A stack definition on disk is seeded, then refreshed from canned
//! `systemctl` and `docker` output.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use compose_stack::services::LIST_UNITS;
use compose_stack::table::write_table;
use compose_stack::{Cell, Config, Output, RecordingDiagnostics, ScriptedRunner, Stack, State, TableOptions};

const NGINX_SHOW: &str = "\
Id=nginx.service
LoadState=loaded
FreezerState=running
ActiveState=active
SubState=running
ExecMainPID=812
ExecMainStartTimestamp=Mon 2024-01-01 10:00:00 UTC
StateChangeTimestamp=Mon 2024-01-01 10:00:01 UTC
MemoryCurrent=1073741824
CPUUsageNSec=1500000000
";

const WEB_APP_INSPECT: &str = r#"[{
    "Id": "4f2a9c1be07d5e0c3b1a",
    "Name": "/web-app-1",
    "Created": "2024-01-01T00:00:00Z",
    "Image": "sha256:9b1e0a7cf3d2",
    "State": {"Status": "running", "StartedAt": "2024-01-02T00:00:00Z", "FinishedAt": "0001-01-01T00:00:00Z"},
    "Config": {"Image": "nginx:1.25", "Labels": {
        "com.docker.compose.project": "web",
        "com.docker.compose.service": "app"
    }},
    "HostConfig": {"NetworkMode": "web_default"},
    "NetworkSettings": {"Ports": {"80/tcp": [{"HostIp": "0.0.0.0", "HostPort": "8080"}]}},
    "Mounts": []
}]"#;

fn write_stack(dir: &Path) -> Config {
    fs::create_dir_all(dir.join("web")).unwrap();
    fs::write(
        dir.join("web/compose.yml"),
        "services:\n  app:\n    image: nginx:1.25\n    ports:\n      - \"8080:80/tcp\"\n",
    )
    .unwrap();
    fs::write(
        dir.join("compose-stack.yaml"),
        "services:\n  systemd:\n    - nginx\n  compose:\n    web:\n      path: web/compose.yml\n",
    )
    .unwrap();
    Config::from_file(&dir.join("compose-stack.yaml")).unwrap()
}

fn host() -> ScriptedRunner {
    ScriptedRunner::new()
        .on(
            &LIST_UNITS.join(" "),
            Output::ok("nginx.service loaded active running nginx\ncron.service loaded active running cron\n"),
        )
        .on("systemctl show nginx", Output::ok(NGINX_SHOW))
        .on("systemctl show cron", Output::ok("Id=cron.service\nLoadState=loaded\n"))
        .on("docker ps --all --format {{.ID}}", Output::ok("4f2a9c1be07d\n"))
        .on("docker inspect 4f2a9c1be07d", Output::ok(WEB_APP_INSPECT))
}

fn configured_units(config: &Config) -> HashSet<String> {
    config.systemd_unit_names().iter().cloned().collect()
}

#[test]
fn test_declared_and_live_services_merge() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_stack(dir.path());
    let runner = host();
    let diag = RecordingDiagnostics::new();

    let mut stack = Stack::new();
    stack.seed_from_config(&config).unwrap();
    assert_eq!(stack.len(), 2);

    stack.refresh_from_systemd(&runner, &diag, Some(&configured_units(&config)));
    stack.refresh_from_dockerd(&runner, &diag, None, false);

    let rows = stack.to_rows();
    assert_eq!(rows.len(), 2);
    assert!(diag.records().is_empty(), "{:?}", diag.records());

    let nginx = stack.get("nginx").unwrap();
    assert!(nginx.wanted);
    assert_eq!(nginx.state, Some(State::Running));
    assert_eq!(nginx.process_id.as_deref(), Some("812"));
    assert_eq!(nginx.memory_usage.as_deref(), Some("1.0G"));
    assert_eq!(nginx.cpu_usage.as_deref(), Some("1.5s"));

    let app = stack.get("app").unwrap();
    assert!(app.wanted);
    assert_eq!(app.stack, "web");
    assert_eq!(app.state, Some(State::Running));
    assert_eq!(app.process_id_short.as_deref(), Some("4f2a9c"));
    assert_eq!(app.net_port_map, vec!["8080(80/tcp)"]);
    assert_eq!(
        app.started_at.map(|t| t.to_string()).as_deref(),
        Some("2024-01-02 00:00:00")
    );

    for row in &rows {
        assert_eq!(row.get("WANTED"), Some(&Cell::Flag(true)));
    }
}

#[test]
fn test_unfiltered_refresh_adds_unwanted_units() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_stack(dir.path());
    let runner = host();
    let diag = RecordingDiagnostics::new();

    let mut stack = Stack::new();
    stack.seed_from_config(&config).unwrap();
    stack.refresh_from_systemd(&runner, &diag, None);

    assert_eq!(stack.len(), 3);
    // the placeholder keeps it wanted
    assert!(stack.get("nginx").unwrap().wanted);
    assert!(!stack.get("cron").unwrap().wanted);
}

#[test]
fn test_refresh_twice_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_stack(dir.path());
    let runner = host();
    let diag = RecordingDiagnostics::new();

    let mut stack = Stack::new();
    stack.seed_from_config(&config).unwrap();
    for _ in 0..2 {
        stack.refresh_from_systemd(&runner, &diag, Some(&configured_units(&config)));
        stack.refresh_from_dockerd(&runner, &diag, None, false);
    }
    assert_eq!(stack.len(), 2);
    assert!(stack.iter().all(|s| s.wanted));
}

#[test]
fn test_bad_container_is_skipped() {
    let runner = ScriptedRunner::new()
        .on("docker ps --all --format {{.ID}}", Output::ok("4f2a9c1be07d\nbroken\ngone\n"))
        .on("docker inspect 4f2a9c1be07d", Output::ok(WEB_APP_INSPECT))
        .on("docker inspect broken", Output::ok(r#"[{"Id": "sha256:abc", "RepoTags": []}]"#));
    let diag = RecordingDiagnostics::new();

    let mut stack = Stack::new();
    stack.refresh_from_dockerd(&runner, &diag, None, false);

    assert_eq!(stack.len(), 1);
    let errors = diag.at(log::Level::Error);
    assert_eq!(errors.len(), 2);
    assert!(errors[0].contains("broken"));
    assert!(errors[1].contains("gone"));
}

#[test]
fn test_compose_scoped_listing() {
    let runner = ScriptedRunner::new()
        .on(
            "docker compose -f /srv/web/compose.yml ps --all --format {{.ID}}",
            Output::ok("4f2a9c1be07d\n"),
        )
        .on("docker inspect 4f2a9c1be07d", Output::ok(WEB_APP_INSPECT));
    let diag = RecordingDiagnostics::new();

    let mut stack = Stack::new();
    stack.refresh_from_dockerd(&runner, &diag, Some(Path::new("/srv/web/compose.yml")), false);
    assert_eq!(stack.len(), 1);
    assert!(!stack.get("app").unwrap().wanted);
}

#[test]
fn test_ignored_project_is_not_seeded() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("compose-stack.yaml"),
        "services:\n  compose:\n    old:\n      path: missing/compose.yml\n      ignored: true\n",
    )
    .unwrap();
    let config = Config::from_file(&dir.path().join("compose-stack.yaml")).unwrap();

    let mut stack = Stack::new();
    stack.seed_from_config(&config).unwrap();
    assert!(stack.is_empty());
}

#[test]
fn test_missing_compose_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("compose-stack.yaml"),
        "services:\n  compose:\n    web:\n",
    )
    .unwrap();
    let config = Config::from_file(&dir.path().join("compose-stack.yaml")).unwrap();

    let mut stack = Stack::new();
    let err = stack.seed_from_config(&config).unwrap_err();
    assert!(err.to_string().contains("services/web/compose.yml"));
}

#[test]
fn test_rows_render_as_table() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_stack(dir.path());
    let mut stack = Stack::new();
    stack.seed_from_config(&config).unwrap();

    let mut out = Vec::new();
    write_table(
        &mut out,
        &stack.to_rows(),
        &TableOptions::with_columns(&["TYPE", "STACK", "NAME", "NETPORT"]),
    )
    .unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(
        text,
        "TYPE     STACK    NAME   NETPORT\nsystemd  systemd  nginx\ncompose  web      app    8080\n"
    );
}
