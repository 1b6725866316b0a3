//! Check that the backend tools are installed

use compose_stack::process::split_command;
use compose_stack::{Runner, SystemRunner};

const TOOLS: &[&str] = &["docker", "systemctl"];
const VERSION_CHECKS: &[&str] = &["docker --version", "systemctl --version"];

pub fn check() -> Result<(), Box<dyn std::error::Error>> {
    println!("CHECK");
    let (passed, total) = run_checks(&SystemRunner);
    println!("{} of {} checks passed", passed, total);

    if passed < total {
        return Err(format!("only {} of {} checks passed", passed, total).into());
    }
    Ok(())
}

/// Look up each tool on PATH and ask for its version; `(passed, total)`
fn run_checks(runner: &dyn Runner) -> (usize, usize) {
    let mut passed = 0;
    let mut total = 0;

    for &tool in TOOLS {
        total += 1;
        let found = runner
            .run(&["which", tool])
            .ok()
            .filter(|out| out.success())
            .and_then(|out| out.lines().first().map(|l| l.to_string()));
        log::debug!("check tool={} on path={:?}", tool, found);
        match found {
            Some(path) => {
                passed += 1;
                log::info!("system tool found: '{}' at {}", tool, path);
            }
            None => log::error!("system tool not found: '{}'", tool),
        }
    }

    for line in VERSION_CHECKS {
        total += 1;
        let result = split_command(line).and_then(|argv| {
            let argv: Vec<&str> = argv.iter().map(String::as_str).collect();
            runner.run(&argv)
        });
        match result {
            Ok(out) if out.success() => {
                passed += 1;
                log::info!("version tested: '{}'", out.lines().first().copied().unwrap_or_default());
            }
            Ok(out) => log::error!("version test '{}' failed: {}", line, out.stderr.trim()),
            Err(e) => log::error!("version test '{}' failed: {}", line, e),
        }
    }

    (passed, total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use compose_stack::{Output, ScriptedRunner};

    #[test]
    fn test_all_tools_present() {
        let runner = ScriptedRunner::new()
            .on("which docker", Output::ok("/usr/bin/docker\n"))
            .on("which systemctl", Output::ok("/usr/bin/systemctl\n"))
            .on("docker --version", Output::ok("Docker version 27.0.3\n"))
            .on("systemctl --version", Output::ok("systemd 255\n"));
        assert_eq!(run_checks(&runner), (4, 4));
    }

    #[test]
    fn test_missing_docker() {
        let runner = ScriptedRunner::new()
            .on("which docker", Output::failed(1, ""))
            .on("which systemctl", Output::ok("/usr/bin/systemctl\n"))
            .on("systemctl --version", Output::ok("systemd 255\n"));
        assert_eq!(run_checks(&runner), (2, 4));
    }
}
