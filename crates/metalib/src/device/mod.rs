//! The boundary between the loader and the GPU driver.
//!
//! The loader only needs to compile or load a library, enumerate and create
//! its functions, and read each function's stage-input attribute names.

#[cfg(target_os = "macos")]
pub mod metal;

use std::{fmt, path::Path};

use crate::error::DeviceError;

/// Metal Shading Language version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LanguageVersion {
    pub major: u8,
    pub minor: u8,
}

impl LanguageVersion {
    pub const V2_4: Self = Self::new(2, 4);

    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }
}

impl Default for LanguageVersion {
    fn default() -> Self {
        Self::V2_4
    }
}

impl fmt::Display for LanguageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Options for in-process source compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    pub fast_math: bool,
    pub language_version: LanguageVersion,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            fast_math: true,
            language_version: LanguageVersion::V2_4,
        }
    }
}

pub trait Device {
    type Library: Library<Function = Self::Function>;
    type Function: Function;

    /// Load a precompiled `.metallib`/`.air` archive.
    fn new_library_with_file(&self, path: &Path) -> Result<Self::Library, DeviceError>;

    /// Compile MSL source synchronously on the calling thread.
    fn new_library_with_source(&self, source: &str, options: &CompileOptions) -> Result<Self::Library, DeviceError>;
}

pub trait Library {
    type Function: Function;

    /// Entry point names in the order the library reports them.
    fn function_names(&self) -> Vec<String>;

    /// Create a callable handle. The handle is owned by the caller and
    /// stays valid independently of the library.
    fn new_function(&self, name: &str) -> Option<Self::Function>;
}

pub trait Function {
    fn name(&self) -> String;

    fn stage_input_attributes(&self) -> Vec<String>;
}
