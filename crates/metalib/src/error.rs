use std::{fmt, path::PathBuf};

use thiserror::Error;

use metalib_env::EnvVarError;

/// Diagnostic reported by the device when a library fails to compile or load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceError {
    pub description: String,
    pub failure_reason: Option<String>,
}

impl DeviceError {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            failure_reason: None,
        }
    }

    #[must_use]
    pub fn with_failure_reason(mut self, reason: impl Into<String>) -> Self {
        self.failure_reason = Some(reason.into());
        self
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)?;
        if let Some(reason) = &self.failure_reason {
            write!(f, " ({reason})")?;
        }
        Ok(())
    }
}

impl std::error::Error for DeviceError {}

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Source file not found: {}", path.display())]
    FileNotFound { path: PathBuf, source: std::io::Error },
    #[error("Source file {} is not valid UTF-8", path.display())]
    SourceNotUtf8 { path: PathBuf, source: std::io::Error },
    #[error("Library compilation failed: {0}")]
    Compile(#[from] DeviceError),
    #[error("Failed to spawn toolchain '{program}': {source}")]
    ToolchainSpawn { program: String, source: std::io::Error },
    #[error("Toolchain stdin write incomplete: wrote {written} of {expected} bytes")]
    ToolchainIo { written: usize, expected: usize },
    #[error("Failed waiting for toolchain '{program}': {source}")]
    ToolchainWait { program: String, source: std::io::Error },
    #[error("SPIR-V stream length {len} is not a multiple of 4")]
    MisalignedSpirv { len: usize },
    #[error("Function '{function}' not found in library {library}")]
    FunctionNotFound { library: String, function: String },
    #[error("Device not found")]
    DeviceNotFound,
    #[error("Invalid loader configuration: {0}")]
    Config(#[from] EnvVarError),
}
