//! Shared subprocess plumbing for capture tools

use std::io::ErrorKind;
use std::process::Stdio;

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tokio::process::{Child, Command};
use tracing::debug;

use crate::application::ports::CaptureError;

/// Spawn a capture tool.
///
/// stdin and stdout are detached, stderr is piped for the supervisor, and
/// the process is killed if its handle is dropped.
pub(crate) fn spawn_capture(program: &str, args: &[String]) -> Result<Child, CaptureError> {
    debug!("Spawning capture: {} {}", program, args.join(" "));

    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                CaptureError::ToolNotFound(program.to_string())
            } else {
                CaptureError::SpawnFailed(format!("{}: {}", program, e))
            }
        })
}

/// Send SIGINT so the tool finalizes its container
pub(crate) fn interrupt(child: &Child) -> Result<(), CaptureError> {
    // No pid means the process was already reaped
    if let Some(id) = child.id() {
        signal::kill(Pid::from_raw(id as i32), Signal::SIGINT)
            .map_err(|e| CaptureError::SignalFailed(format!("SIGINT: {}", e)))?;
    }
    Ok(())
}

/// Check if a tool binary is available using `which`
pub async fn is_tool_available(tool: &str) -> bool {
    Command::new("which")
        .arg(tool)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sh_is_available() {
        assert!(is_tool_available("sh").await);
        assert!(!is_tool_available("nova-replay-no-such-tool").await);
    }

    #[tokio::test]
    async fn missing_program_maps_to_tool_not_found() {
        let err = spawn_capture("nova-replay-no-such-tool", &[]).unwrap_err();
        assert!(matches!(err, CaptureError::ToolNotFound(_)));
    }

    #[tokio::test]
    async fn interrupt_stops_sleeping_process() {
        let mut child = spawn_capture("sleep", &["30".to_string()]).unwrap();
        interrupt(&child).unwrap();
        let status = child.wait().await.unwrap();
        assert!(!status.success());
    }
}
