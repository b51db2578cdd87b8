//! Turning MSL into libraries, either in-process or through the external toolchain.

pub mod artifact;
pub mod toolchain;

use std::{fmt, fs::File, io::ErrorKind, path::Path};

use tracing::{debug, error};

use crate::{
    config::LoaderConfig,
    device::Device,
    error::{DeviceError, LoaderError},
};
use artifact::TempArtifact;
use toolchain::{Toolchain, ToolchainInput};

/// How MSL source is compiled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BuildMode {
    /// Compile synchronously through the device's own compiler.
    Runtime,
    /// Run the external toolchain into a temporary artifact, then load it.
    #[default]
    Toolchain,
}

impl BuildMode {
    pub const fn from_runtime_flag(runtime: bool) -> Self {
        if runtime { BuildMode::Runtime } else { BuildMode::Toolchain }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            BuildMode::Runtime => "runtime",
            BuildMode::Toolchain => "toolchain",
        }
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Borrowed view of the loader's collaborators used for a single import.
pub(crate) struct Backend<'a, D, T> {
    device: &'a D,
    toolchain: &'a T,
    config: &'a LoaderConfig,
}

impl<'a, D: Device, T: Toolchain> Backend<'a, D, T> {
    pub(crate) fn new(device: &'a D, toolchain: &'a T, config: &'a LoaderConfig) -> Self {
        Self { device, toolchain, config }
    }

    /// Load a precompiled archive.
    pub(crate) fn load_archive(&self, path: &Path) -> Result<D::Library, LoaderError> {
        self.device
            .new_library_with_file(path)
            .inspect(|_| debug!(path = %path.display(), "loaded library archive"))
            .map_err(|err| {
                report_device_error(&err, "failed to load library archive");
                err.into()
            })
    }

    pub(crate) fn compile_source(&self, source: &str, mode: BuildMode) -> Result<D::Library, LoaderError> {
        match mode {
            BuildMode::Runtime => self.compile_in_process(source),
            BuildMode::Toolchain => self.compile_with_toolchain(ToolchainInput::Stdin(source)),
        }
    }

    pub(crate) fn compile_file(&self, path: &Path, mode: BuildMode) -> Result<D::Library, LoaderError> {
        match mode {
            BuildMode::Runtime => {
                let source = std::fs::read_to_string(path).map_err(|source| unreadable_source(path, source))?;
                self.compile_in_process(&source)
            }
            BuildMode::Toolchain => {
                // The toolchain would fail too, but with a far less useful message.
                File::open(path).map_err(|source| file_not_found(path, source))?;
                self.compile_with_toolchain(ToolchainInput::File(path))
            }
        }
    }

    fn compile_in_process(&self, source: &str) -> Result<D::Library, LoaderError> {
        self.device
            .new_library_with_source(source, &self.config.compile_options)
            .map_err(|err| {
                report_device_error(&err, "failed to compile library source");
                err.into()
            })
    }

    fn compile_with_toolchain(&self, input: ToolchainInput<'_>) -> Result<D::Library, LoaderError> {
        let artifact = TempArtifact::new(&self.config.artifact_dir);
        let run = self.toolchain.compile(input, artifact.path())?;
        if let ToolchainInput::Stdin(source) = input
            && run.stdin_bytes != source.len()
        {
            error!(
                written = run.stdin_bytes,
                expected = source.len(),
                "toolchain did not accept the whole program, skipping artifact load"
            );
            return Err(LoaderError::ToolchainIo {
                written: run.stdin_bytes,
                expected: source.len(),
            });
        }
        self.load_archive(artifact.path())
    }
}

fn report_device_error(err: &DeviceError, message: &str) {
    error!(
        description = %err.description,
        failure_reason = err.failure_reason.as_deref().unwrap_or(""),
        "{message}"
    );
}

fn unreadable_source(path: &Path, source: std::io::Error) -> LoaderError {
    if source.kind() != ErrorKind::InvalidData {
        return file_not_found(path, source);
    }
    error!(path = %path.display(), "source file is not valid UTF-8");
    LoaderError::SourceNotUtf8 {
        path: path.to_path_buf(),
        source,
    }
}

fn file_not_found(path: &Path, source: std::io::Error) -> LoaderError {
    error!(path = %path.display(), %source, "cannot open source file");
    LoaderError::FileNotFound {
        path: path.to_path_buf(),
        source,
    }
}
