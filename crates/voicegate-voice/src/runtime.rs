//! Shared subprocess plumbing for the model runtimes.

use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Runs `command`, optionally feeding `input` on stdin, and returns stdout.
///
/// Errors are returned as plain messages; callers wrap them in the
/// appropriate [`crate::VoiceError`] variant. `label` names the runtime in
/// those messages.
pub(crate) async fn run(
    mut command: Command,
    label: &str,
    input: Option<Vec<u8>>,
    timeout: Duration,
) -> Result<Vec<u8>, String> {
    command
        .stdin(if input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command
        .spawn()
        .map_err(|e| format!("Failed to spawn {}: {}", label, e))?;

    // Write stdin from a separate task so a runtime that fills its stdout
    // buffer before draining stdin cannot deadlock us.
    let write_task = match input {
        Some(bytes) => {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| format!("Failed to open {} stdin", label))?;
            Some(tokio::spawn(async move {
                stdin.write_all(&bytes).await?;
                stdin.shutdown().await
            }))
        }
        None => None,
    };

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| {
            format!(
                "{} process timed out after {} seconds",
                label,
                timeout.as_secs()
            )
        })?
        .map_err(|e| format!("Failed to wait for {}: {}", label, e))?;

    if let Some(task) = write_task {
        match task.await {
            Ok(Ok(())) => {}
            // A runtime may exit successfully without consuming all input.
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
            Ok(Err(e)) => return Err(format!("Failed to write to {} stdin: {}", label, e)),
            Err(e) => return Err(format!("Stdin task failed: {}", e)),
        }
    }

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "{} failed ({}): {}",
            label,
            output.status,
            stderr.trim()
        ));
    }

    Ok(output.stdout)
}
