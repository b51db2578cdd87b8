//! Typed process-environment configuration shared by the metalib crates.

pub mod environment;

pub use environment::{
    EnvVar, Environment, ScopedEnv,
    instrument::{InstrumentEnvVar, LOG_LEVEL, METRICS_CONSOLE, METRICS_JSONL_PATH},
    loader::{ARTIFACT_DIR, LoaderEnvVar, RUNTIME_BUILD, TOOLCHAIN, TOOLCHAIN_SDK},
    value::{EnvVarError, EnvVarFormatError, EnvVarParseError, TypedEnvVar, TypedEnvVarGuard},
};
