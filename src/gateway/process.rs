use serde_json::Value;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::error::GatewayError;
use crate::models::SongTitle;
use crate::util::preview;

/// A local program that turns a JSON selection into one line of JSON recommendations.
///
/// Invoked as `program args... '<json array of titles>'`. The child is killed if
/// the call is dropped or times out, so no process outlives the request.
#[derive(Debug, Clone)]
pub struct RecommendProcess {
    pub program: String,
    pub args: Vec<String>,
    pub workdir: Option<PathBuf>,
    pub timeout: Duration,
}

impl RecommendProcess {
    pub async fn run(&self, songs: &[SongTitle]) -> Result<Value, GatewayError> {
        let selection = serde_json::to_string(songs)
            .map_err(|e| GatewayError::Process(format!("failed to encode selection: {e}")))?;

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(&selection)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(dir) = &self.workdir {
            command.current_dir(dir);
        }

        debug!(program = %self.program, songs = songs.len(), "Running recommendation process");

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                GatewayError::Process(format!("timed out after {}s", self.timeout.as_secs_f32()))
            })?
            .map_err(|e| GatewayError::Process(format!("failed to start {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GatewayError::Process(format!(
                "exit code {:?}: {}",
                output.status.code(),
                preview(stderr.trim(), 500)
            )));
        }

        parse_single_line(&String::from_utf8_lossy(&output.stdout))
    }
}

/// The program must print exactly one non-empty line of JSON.
fn parse_single_line(stdout: &str) -> Result<Value, GatewayError> {
    let mut lines = stdout.lines().filter(|line| !line.trim().is_empty());

    let line = lines
        .next()
        .ok_or_else(|| GatewayError::Process("produced no output".to_string()))?;
    if lines.next().is_some() {
        return Err(GatewayError::Process(format!(
            "expected one line of output, got: {}",
            preview(stdout.trim(), 200)
        )));
    }

    serde_json::from_str(line.trim()).map_err(|e| {
        GatewayError::Process(format!("invalid JSON output ({e}): {}", preview(line, 200)))
    })
}
