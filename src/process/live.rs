//! Live tail of long-running commands
//!
//! Redraws a fixed window with the latest stdout lines once per poll
//! interval, then clears it when the command ends. Runs on its own
//! single-threaded runtime and shares nothing with discovery.

use std::io::Write;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio::time::Instant;

use super::{BackendError, Output};
use crate::console;

/// Default number of lines kept on screen
pub const LIVE_WINDOW: usize = 7;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Run a command, tailing its stdout in a `window`-line block on stdout
pub fn run_live(argv: &[&str], window: usize) -> Result<Output, BackendError> {
    let program = argv.first().copied().unwrap_or_default().to_string();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|source| BackendError::Unavailable {
            program: program.clone(),
            source,
        })?;
    runtime.block_on(run_live_async(argv, window))
}

async fn run_live_async(argv: &[&str], window: usize) -> Result<Output, BackendError> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| BackendError::parse("command line", "empty argv"))?;
    let unavailable = |source| BackendError::Unavailable {
        program: program.to_string(),
        source,
    };

    log::debug!("live command: {}", argv.join(" "));

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(unavailable)?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| BackendError::parse(program.to_string(), "stdout not captured"))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| BackendError::parse(program.to_string(), "stderr not captured"))?;

    let stderr_task = tokio::spawn(async move {
        let mut buf = String::new();
        stderr.read_to_string(&mut buf).await.map(|_| buf)
    });

    let mut term = std::io::stdout();
    let lines = tail(BufReader::new(stdout), window, &mut term)
        .await
        .map_err(unavailable)?;
    let status = child.wait().await.map_err(unavailable)?;
    let stderr = match stderr_task.await {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => return Err(unavailable(e)),
        Err(e) => return Err(BackendError::parse(program.to_string(), e.to_string())),
    };

    let mut stdout = lines.join("\n");
    if !stdout.is_empty() {
        stdout.push('\n');
    }
    Ok(Output {
        code: status.code(),
        stdout,
        stderr,
    })
}

/// Tail `reader` into `out` until EOF, returning every line read
pub async fn tail<R, W>(reader: R, window: usize, out: &mut W) -> std::io::Result<Vec<String>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = reader.lines();
    let mut collected = Vec::new();

    console::write_lines(out, &framed(&[], window))?;

    loop {
        let deadline = Instant::now() + POLL_INTERVAL;
        let mut received = 0;
        let mut finished = false;

        // next_line is cancel safe, so a timeout never drops a partial line
        loop {
            match tokio::time::timeout_at(deadline, lines.next_line()).await {
                Err(_) => break,
                Ok(Ok(Some(line))) => {
                    collected.push(line);
                    received += 1;
                }
                Ok(Ok(None)) => {
                    finished = true;
                    break;
                }
                Ok(Err(e)) => return Err(e),
            }
        }

        if received > 0 {
            console::replace_lines(out, &framed(&collected, window))?;
        }
        if finished {
            break;
        }
    }

    console::clear_lines(out, window)?;
    Ok(collected)
}

/// Last `window` lines, padded at the top, dimmed and prefixed
fn framed(lines: &[String], window: usize) -> Vec<String> {
    let start = lines.len().saturating_sub(window);
    let visible = &lines[start..];
    let mut framed = vec![String::new(); window - visible.len()];
    framed.extend(visible.iter().cloned());
    framed
        .into_iter()
        .map(|line| format!("{}>> {}{}", console::DIM, line, console::RESET))
        .collect()
}
