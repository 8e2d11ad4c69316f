use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const FILTER_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_STDERR_SHOWN: usize = 200;

#[derive(Debug, Error)]
pub enum FilterCommandError {
    #[error("Failed to start filter command: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("Filter command I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Filter command exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("Filter command timed out")]
    Timeout,
}

/// Pipes a downloaded feed body through a user's shell command and returns
/// its stdout, which is parsed in place of the original body.
///
/// The command runs under `sh -c`. Stdin is written while stdout is being
/// read so a filter that streams never blocks on a full pipe.
pub async fn run_filter(command: &str, input: &[u8]) -> Result<Vec<u8>, FilterCommandError> {
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(FilterCommandError::Spawn)?;

    let mut stdin = child.stdin.take();
    let feed_stdin = async move {
        if let Some(stdin) = stdin.as_mut() {
            match stdin.write_all(input).await {
                // Filters that ignore their input close the pipe early
                Err(e) if e.kind() != ErrorKind::BrokenPipe => return Err(e),
                _ => {}
            }
        }
        // Dropping stdin sends EOF
        drop(stdin);
        Ok(())
    };

    let run = async { tokio::join!(feed_stdin, child.wait_with_output()) };
    let (written, output) = tokio::time::timeout(FILTER_TIMEOUT, run)
        .await
        .map_err(|_| FilterCommandError::Timeout)?;
    written?;
    let output = output?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = crate::util::truncate_to_width(stderr.trim(), MAX_STDERR_SHOWN).into_owned();
        return Err(FilterCommandError::Failed {
            status: output.status.to_string(),
            stderr,
        });
    }

    tracing::debug!(
        command = %command,
        input = input.len(),
        output = output.stdout.len(),
        "Filter command finished"
    );
    Ok(output.stdout)
}
