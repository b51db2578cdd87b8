//! Loader and cache for Metal shader libraries.
//!
//! [`LibraryLoader`] turns an identifier into a compiled library: a path to a
//! `.metallib`/`.air` archive, a path to MSL source, a path to SPIR-V, or the
//! MSL program text itself. Each distinct identifier is materialised once and
//! kept in a [`LibraryCache`] until the loader is dropped.

pub mod backend;
pub mod cache;
pub mod config;
pub mod device;
pub mod error;
pub mod loader;
pub mod source;
pub mod spirv;

pub use backend::{BuildMode, toolchain::{Toolchain, ToolchainInput, ToolchainRun, XcrunToolchain}};
pub use cache::{CacheMetrics, LibraryCache};
pub use config::{LoaderConfig, ToolchainConfig};
pub use device::{CompileOptions, Device, Function, LanguageVersion, Library};
pub use error::{DeviceError, LoaderError};
pub use loader::LibraryLoader;
pub use source::{SourceKind, classify, key_label};
pub use spirv::{Translation, decode_words, read_spirv_file, translate_to_msl};

#[cfg(target_os = "macos")]
pub use device::metal::{MetalDevice, MetalFunction, MetalLibrary};

/// Loader over the system default Metal device.
#[cfg(target_os = "macos")]
pub type MetalLibraryLoader = LibraryLoader<MetalDevice, XcrunToolchain>;
