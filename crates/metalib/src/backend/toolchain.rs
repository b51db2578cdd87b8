//! Out-of-process compilation through the Metal command line tools.

use std::{
    ffi::OsStr,
    io::{ErrorKind, Write},
    path::Path,
    process::{Command, Stdio},
    time::Instant,
};

use metalib_instrumentation::{MetricEvent, record_metric};
use tracing::{debug, error, warn};

use crate::{config::ToolchainConfig, error::LoaderError};

/// What the toolchain compiles.
#[derive(Debug, Clone, Copy)]
pub enum ToolchainInput<'a> {
    /// Source text piped through stdin.
    Stdin(&'a str),
    /// Path to a source file.
    File(&'a Path),
}

/// Result of one toolchain run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolchainRun {
    /// Bytes accepted by the child's stdin. Always 0 for file input.
    pub stdin_bytes: usize,
    /// `None` when the child was killed by a signal.
    pub exit_code: Option<i32>,
}

/// External compiler producing a `.metallib` at `output`.
///
/// The exit status is reported but not judged here; whether the artifact
/// loads is what decides success.
pub trait Toolchain {
    fn compile(&self, input: ToolchainInput<'_>, output: &Path) -> Result<ToolchainRun, LoaderError>;
}

/// `xcrun -sdk <sdk> metal ...`
#[derive(Clone, Debug, Default)]
pub struct XcrunToolchain {
    config: ToolchainConfig,
}

impl XcrunToolchain {
    pub fn new(config: ToolchainConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ToolchainConfig {
        &self.config
    }
}

impl Toolchain for XcrunToolchain {
    fn compile(&self, input: ToolchainInput<'_>, output: &Path) -> Result<ToolchainRun, LoaderError> {
        let program = self.config.program.as_str();
        let input_arg = match input {
            ToolchainInput::Stdin(_) => OsStr::new("-"),
            ToolchainInput::File(path) => path.as_os_str(),
        };
        let args = self.config.args(input_arg, output);
        debug!(program, ?args, "invoking toolchain");

        let started = Instant::now();
        let mut child = Command::new(program)
            .args(&args)
            .stdin(match input {
                ToolchainInput::Stdin(_) => Stdio::piped(),
                ToolchainInput::File(_) => Stdio::null(),
            })
            .spawn()
            .map_err(|source| {
                error!(program, %source, "failed to spawn toolchain");
                LoaderError::ToolchainSpawn {
                    program: program.to_owned(),
                    source,
                }
            })?;

        let mut stdin_bytes = 0;
        if let ToolchainInput::Stdin(source) = input
            && let Some(mut stdin) = child.stdin.take()
        {
            let bytes = source.as_bytes();
            while stdin_bytes < bytes.len() {
                match stdin.write(&bytes[stdin_bytes..]) {
                    Ok(0) => break,
                    Ok(n) => stdin_bytes += n,
                    Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                    Err(err) => {
                        warn!(program, %err, written = stdin_bytes, "toolchain stdin closed early");
                        break;
                    }
                }
            }
            // Dropping stdin sends EOF so the compiler can finish.
        }

        let status = child.wait().map_err(|source| {
            error!(program, %source, "failed waiting for toolchain");
            LoaderError::ToolchainWait {
                program: program.to_owned(),
                source,
            }
        })?;

        let run = ToolchainRun {
            stdin_bytes,
            exit_code: status.code(),
        };
        if !status.success() {
            warn!(program, exit_code = ?run.exit_code, "toolchain exited unsuccessfully");
        }
        record_metric!(MetricEvent::ToolchainInvoked {
            program: program.to_owned(),
            exit_code: run.exit_code,
            stdin_bytes: run.stdin_bytes as u64,
            duration_us: started.elapsed().as_micros() as u64,
        });
        Ok(run)
    }
}

#[path = "toolchain.test.rs"]
mod tests;
