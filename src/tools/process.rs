//! Argument-vector invocation of external converters.
//!
//! Nothing here goes through a shell: every argument reaches the child
//! verbatim, so upload file names can never be interpreted as syntax. On
//! unix the child leads its own process group, and the whole group is
//! killed once the future running it finishes or is dropped. That is how
//! the dispatcher's timeout stops a stuck converter along with any helper
//! processes it forked.

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;

use tokio::process::Command;
use tracing::{debug, warn};

use super::ToolError;

/// Longest stderr excerpt carried in an error message
const STDERR_LIMIT: usize = 2048;

#[derive(Debug, Clone)]
pub struct ExternalCommand {
    program: String,
    args: Vec<OsString>,
}

#[derive(Debug)]
pub struct ProcessOutput {
    pub stdout: Vec<u8>,
}

impl ExternalCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Run to completion, failing on spawn errors and non-zero exit codes.
    pub async fn run(self) -> Result<ProcessOutput, ToolError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let started = Instant::now();
        let child = command.spawn().map_err(|source| ToolError::Spawn {
            program: self.program.clone(),
            source,
        })?;
        let _group = ProcessGroup::new(&self.program, child.id());

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| ToolError::Io {
                program: self.program.clone(),
                source,
            })?;

        let stderr = excerpt(&output.stderr);
        debug!(
            program = %self.program,
            status = %output.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "External converter finished"
        );

        if !output.status.success() {
            return Err(ToolError::Failed {
                program: self.program,
                code: output.status.code(),
                stderr,
            });
        }
        if !stderr.is_empty() {
            debug!(
                program = %self.program,
                stderr = %stderr,
                "External converter wrote to stderr"
            );
        }

        Ok(ProcessOutput {
            stdout: output.stdout,
        })
    }
}

/// Kills every process left in the child's group when dropped.
///
/// `kill_on_drop` only reaches the direct child; converters such as
/// LibreOffice fork helpers that would otherwise keep running.
struct ProcessGroup {
    program: String,
    pgid: Option<u32>,
}

impl ProcessGroup {
    fn new(program: &str, pid: Option<u32>) -> Self {
        Self {
            program: program.to_string(),
            pgid: pid.filter(|_| cfg!(unix)),
        }
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        let Some(pgid) = self.pgid else {
            return;
        };
        // Builtin `kill`; exits non-zero once the group is empty
        let result = std::process::Command::new("sh")
            .arg("-c")
            .arg(format!("kill -s KILL -- -{pgid}"))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        if let Err(e) = result {
            warn!(
                program = %self.program,
                pgid,
                error = %e,
                "Failed to signal converter process group"
            );
        }
    }
}

/// A converter that exits 0 must also have written what it promised.
pub async fn require_output(program: &str, path: &Path) -> Result<(), ToolError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() => Ok(()),
        _ => Err(ToolError::MissingOutput {
            program: program.to_string(),
            path: path.to_path_buf(),
        }),
    }
}

fn excerpt(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let text = text.trim();
    if text.len() <= STDERR_LIMIT {
        return text.to_string();
    }
    let mut cut = STDERR_LIMIT;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &text[..cut])
}
