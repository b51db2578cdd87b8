//! Loader-specific environment variables.

use std::path::PathBuf;

use super::EnvVar;
use super::value::{TypedEnvVar, format_bool, format_path, format_word, parse_bool, parse_path, parse_word};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoaderEnvVar {
    /// Compile source in-process through the device instead of the external toolchain.
    RuntimeBuild,
    /// Program used to drive the external Metal compiler.
    Toolchain,
    /// SDK name passed to the toolchain driver.
    ToolchainSdk,
    /// Directory that receives temporary compiled artifacts.
    ArtifactDir,
}

impl LoaderEnvVar {
    pub const fn key(self) -> &'static str {
        match self {
            LoaderEnvVar::RuntimeBuild => "METALIB_RUNTIME_BUILD",
            LoaderEnvVar::Toolchain => "METALIB_TOOLCHAIN",
            LoaderEnvVar::ToolchainSdk => "METALIB_TOOLCHAIN_SDK",
            LoaderEnvVar::ArtifactDir => "METALIB_ARTIFACT_DIR",
        }
    }

    pub const fn into_env(self) -> EnvVar {
        EnvVar::Loader(self)
    }
}

pub const RUNTIME_BUILD: TypedEnvVar<bool> = TypedEnvVar::new(LoaderEnvVar::RuntimeBuild.into_env(), parse_bool, format_bool);

pub const TOOLCHAIN: TypedEnvVar<String> = TypedEnvVar::new(LoaderEnvVar::Toolchain.into_env(), parse_word, format_word);

pub const TOOLCHAIN_SDK: TypedEnvVar<String> = TypedEnvVar::new(LoaderEnvVar::ToolchainSdk.into_env(), parse_word, format_word);

pub const ARTIFACT_DIR: TypedEnvVar<PathBuf> = TypedEnvVar::new(LoaderEnvVar::ArtifactDir.into_env(), parse_path, format_path);
