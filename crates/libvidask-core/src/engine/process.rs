//! Subprocess gateway to the external RAG engine
//!
//! One process per invocation, never pooled. stdout and stderr are captured
//! into separate capped buffers, the exit status decides success, and a hung
//! process is killed after the configured timeout.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use super::RagEngine;
use crate::config::{missing_credential, Config, Credential};
use crate::error::{EngineResult, VidaskError};
use crate::types::request::clear_args;
use crate::types::{ClearTarget, RequestKind, VideoContext};

const READ_CHUNK: usize = 8 * 1024;

/// Launches the engine process and maps its outcome onto [`EngineResult`]
#[derive(Debug, Clone)]
pub struct ProcessGateway {
    program: PathBuf,
    prefix_args: Vec<String>,
    working_dir: Option<PathBuf>,
    credential_env: String,
    credential: Option<Credential>,
    timeout: Duration,
    max_output_bytes: usize,
}

impl ProcessGateway {
    pub fn new(config: &Config) -> Self {
        Self {
            program: config.engine.program.clone(),
            prefix_args: config.engine.args.clone(),
            working_dir: config.engine.working_dir.clone(),
            credential_env: config.engine.credential_env.clone(),
            credential: config.credential.clone(),
            timeout: config.engine.timeout(),
            max_output_bytes: config.engine.max_output_bytes,
        }
    }

    /// Run the engine once with `args` appended to the configured prefix.
    ///
    /// Exactly one result is produced per call. Without a credential the
    /// process is never started.
    pub async fn invoke(&self, kind: RequestKind, args: &[String]) -> EngineResult {
        let credential = self.credential.as_ref().ok_or_else(|| {
            error!(kind = %kind, env = %self.credential_env, "Engine credential is not set");
            missing_credential(&self.credential_env)
        })?;

        let mut command = Command::new(&self.program);
        command
            .args(&self.prefix_args)
            .args(args)
            .env(&self.credential_env, credential.expose())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(ref dir) = self.working_dir {
            command.current_dir(dir);
        }

        debug!(kind = %kind, program = %self.program.display(), ?args, "Spawning engine");
        let started = Instant::now();

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                error!(kind = %kind, program = %self.program.display(), "Failed to start engine: {}", e);
                return Err(VidaskError::LaunchFailure(e.to_string()));
            }
        };

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let limit = self.max_output_bytes;

        let outcome = tokio::time::timeout(self.timeout, async {
            tokio::join!(
                read_capped(stdout, limit),
                read_capped(stderr, limit),
                child.wait()
            )
        })
        .await;

        let elapsed_ms = started.elapsed().as_millis() as u64;

        let ((stdout, stdout_truncated), (stderr, stderr_truncated), status) = match outcome {
            Ok(captured) => captured,
            Err(_) => {
                // kill() also reaps the child
                if let Err(e) = child.kill().await {
                    warn!(kind = %kind, "Failed to kill timed out engine: {}", e);
                }
                let timeout_ms = self.timeout.as_millis() as u64;
                warn!(kind = %kind, timeout_ms, "Engine timed out");
                return Err(VidaskError::Timeout(timeout_ms));
            }
        };

        if stdout_truncated || stderr_truncated {
            warn!(
                kind = %kind,
                limit,
                stdout_truncated,
                stderr_truncated,
                "Engine output exceeded capture limit, excess discarded"
            );
        }

        let status = match status {
            Ok(status) => status,
            Err(e) => {
                error!(kind = %kind, "Failed to wait for engine: {}", e);
                return Err(VidaskError::EngineFailure(e.to_string()));
            }
        };

        let stderr = String::from_utf8_lossy(&stderr).into_owned();

        if status.success() {
            let text = String::from_utf8_lossy(&stdout).trim().to_string();
            info!(kind = %kind, elapsed_ms, bytes = text.len(), "Engine finished");
            if !stderr.trim().is_empty() {
                debug!(kind = %kind, stderr = %stderr.trim(), "Engine diagnostics");
            }
            return Ok(text);
        }

        error!(
            kind = %kind,
            exit_code = ?status.code(),
            elapsed_ms,
            stderr = %stderr.trim(),
            "Engine exited with failure"
        );

        let message = if stderr.trim().is_empty() {
            match status.code() {
                Some(code) => format!("engine exited with code {}", code),
                None => "engine was terminated by a signal".to_string(),
            }
        } else {
            stderr
        };
        Err(VidaskError::EngineFailure(message))
    }
}

#[async_trait]
impl RagEngine for ProcessGateway {
    async fn ask(&self, query: &str, video: &VideoContext) -> EngineResult {
        let args = [query.to_string(), video.video_id.to_string()];
        self.invoke(RequestKind::Ask, &args).await
    }

    async fn clear(&self, target: &ClearTarget) -> EngineResult {
        self.invoke(RequestKind::ClearCache, &clear_args(target)).await
    }
}

/// Read a stream to EOF keeping at most `limit` bytes.
/// Reading continues past the limit so the child never blocks on a full pipe.
async fn read_capped<R>(reader: Option<R>, limit: usize) -> (Vec<u8>, bool)
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return (Vec::new(), false);
    };

    let mut buf = Vec::new();
    let mut truncated = false;
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                let room = limit.saturating_sub(buf.len());
                if n > room {
                    truncated = true;
                }
                buf.extend_from_slice(&chunk[..n.min(room)]);
            }
            Err(e) => {
                warn!("Failed to read engine output: {}", e);
                break;
            }
        }
    }
    (buf, truncated)
}
