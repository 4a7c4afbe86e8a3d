use std::io;
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::select;
use tracing::debug;

use crate::compose::ToolCommand;

/// Run a composed command, streaming its stdout and stderr to the console line by line.
///
/// The child is killed if the returned future is dropped before it exits.
pub async fn run_command(command: &ToolCommand) -> io::Result<ExitStatus> {
    debug!("Running: {command}");
    let mut child = Command::new(command.program())
        .args(command.args())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            let program = command.program().display();
            io::Error::new(e.kind(), format!("failed to start {program}: {e}"))
        })?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::other("stdout not captured"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| io::Error::other("stderr not captured"))?;
    // Tools print raw file names, so lines are split as bytes and printed lossily
    let mut stdout = BufReader::new(stdout).split(b'\n');
    let mut stderr = BufReader::new(stderr).split(b'\n');
    let mut stdout_open = true;
    let mut stderr_open = true;
    while stdout_open || stderr_open {
        select! {
            line = stdout.next_segment(), if stdout_open => match line? {
                Some(line) => print_line(&line),
                None => stdout_open = false,
            },
            line = stderr.next_segment(), if stderr_open => match line? {
                Some(line) => print_line(&line),
                None => stderr_open = false,
            },
        }
    }

    let status = child.wait().await?;
    match status.code() {
        Some(code) => println!("Command exited with code: {code}"),
        None => println!("Command terminated by signal"),
    }
    Ok(status)
}

fn print_line(line: &[u8]) {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    println!("{}", String::from_utf8_lossy(line));
}
