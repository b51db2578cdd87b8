use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
};

use metalib_env::{ARTIFACT_DIR, RUNTIME_BUILD, TOOLCHAIN, TOOLCHAIN_SDK};

use crate::{
    backend::BuildMode,
    device::{CompileOptions, LanguageVersion},
    error::LoaderError,
};

/// Command line shape of the external Metal compiler.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolchainConfig {
    /// Driver program, normally `xcrun`.
    pub program: String,
    pub sdk: String,
    pub optimization: String,
    pub language_version: LanguageVersion,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            program: "xcrun".to_owned(),
            sdk: "macosx".to_owned(),
            optimization: "-Ofast".to_owned(),
            language_version: LanguageVersion::V2_4,
        }
    }
}

impl ToolchainConfig {
    /// Arguments compiling `input` (a source path, or `-` for stdin) into `output`.
    pub fn args(&self, input: &OsStr, output: &Path) -> Vec<OsString> {
        vec![
            "-sdk".into(),
            self.sdk.clone().into(),
            "metal".into(),
            format!("-std=macos-metal{}", self.language_version).into(),
            "-xmetal".into(),
            self.optimization.clone().into(),
            "-o".into(),
            output.as_os_str().to_owned(),
            input.to_owned(),
        ]
    }
}

/// Settings shared by every import performed through one loader.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Mode used by [`LibraryLoader::get_kernel_function`](crate::LibraryLoader::get_kernel_function).
    pub build_mode: BuildMode,
    pub compile_options: CompileOptions,
    pub toolchain: ToolchainConfig,
    /// Where toolchain output is written before it is loaded.
    pub artifact_dir: PathBuf,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            build_mode: BuildMode::default(),
            compile_options: CompileOptions::default(),
            toolchain: ToolchainConfig::default(),
            artifact_dir: std::env::temp_dir(),
        }
    }
}

impl LoaderConfig {
    /// Defaults overridden by any `METALIB_*` loader variables that are set.
    pub fn from_env() -> Result<Self, LoaderError> {
        let defaults = Self::default();
        let runtime = RUNTIME_BUILD.get()?.unwrap_or(defaults.build_mode == BuildMode::Runtime);
        Ok(Self {
            build_mode: BuildMode::from_runtime_flag(runtime),
            toolchain: ToolchainConfig {
                program: TOOLCHAIN.get_or(defaults.toolchain.program.clone())?,
                sdk: TOOLCHAIN_SDK.get_or(defaults.toolchain.sdk.clone())?,
                ..defaults.toolchain
            },
            artifact_dir: ARTIFACT_DIR.get_or(defaults.artifact_dir)?,
            compile_options: defaults.compile_options,
        })
    }

    #[must_use]
    pub fn with_build_mode(mut self, mode: BuildMode) -> Self {
        self.build_mode = mode;
        self
    }

    #[must_use]
    pub fn with_artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.artifact_dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_toolchain_program(mut self, program: impl Into<String>) -> Self {
        self.toolchain.program = program.into();
        self
    }

    #[must_use]
    pub fn with_fast_math(mut self, enabled: bool) -> Self {
        self.compile_options.fast_math = enabled;
        self
    }

    /// Pin the MSL version for in-process compiles, toolchain compiles and SPIR-V translation.
    #[must_use]
    pub fn with_language_version(mut self, version: LanguageVersion) -> Self {
        self.compile_options.language_version = version;
        self.toolchain.language_version = version;
        self
    }
}

#[path = "config.test.rs"]
mod tests;
