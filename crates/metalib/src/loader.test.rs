#![cfg(test)]

use std::{
    cell::Cell,
    path::{Path, PathBuf},
};

use super::*;
use crate::{
    backend::toolchain::{ToolchainInput, ToolchainRun},
    device::CompileOptions,
    error::DeviceError,
};

/// Device whose "source" is a comma separated list of function names.
#[derive(Default)]
struct ListDevice {
    compiles: Cell<usize>,
}

struct ListLibrary(Vec<String>);

struct ListFunction(String);

impl Device for ListDevice {
    type Library = ListLibrary;
    type Function = ListFunction;

    fn new_library_with_file(&self, path: &Path) -> Result<ListLibrary, DeviceError> {
        Err(DeviceError::new(format!("no archive at {}", path.display())))
    }

    fn new_library_with_source(&self, source: &str, _options: &CompileOptions) -> Result<ListLibrary, DeviceError> {
        self.compiles.set(self.compiles.get() + 1);
        Ok(ListLibrary(source.split(',').filter(|name| !name.is_empty()).map(str::to_owned).collect()))
    }
}

impl Library for ListLibrary {
    type Function = ListFunction;

    fn function_names(&self) -> Vec<String> {
        self.0.clone()
    }

    fn new_function(&self, name: &str) -> Option<ListFunction> {
        self.0.iter().find(|candidate| *candidate == name).map(|found| ListFunction(found.clone()))
    }
}

impl Function for ListFunction {
    fn name(&self) -> String {
        self.0.clone()
    }

    fn stage_input_attributes(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Toolchain that must never run.
struct NoToolchain;

impl Toolchain for NoToolchain {
    fn compile(&self, _input: ToolchainInput<'_>, output: &Path) -> Result<ToolchainRun, LoaderError> {
        panic!("toolchain invoked for {}", output.display());
    }
}

fn runtime_loader() -> LibraryLoader<ListDevice, NoToolchain> {
    let config = LoaderConfig::default().with_build_mode(BuildMode::Runtime);
    LibraryLoader::with_toolchain(ListDevice::default(), NoToolchain, config)
}

#[test]
fn test_empty_loader_dumps_nothing() {
    let loader = runtime_loader();
    assert_eq!(loader.to_string(), "");
    assert!(loader.find_kernel_function("anything").is_none());
    assert_eq!(loader.metrics(), CacheMetrics::default());
}

#[test]
fn test_get_kernel_function_uses_configured_mode() {
    let mut loader = runtime_loader();
    let function = loader.get_kernel_function("reduce,scan", "scan").expect("scan exists");
    assert_eq!(function.name(), "scan");
    assert!(loader.get_kernel_function("reduce,scan", "reduce").is_ok());
    assert_eq!(loader.device().compiles.get(), 1);
}

#[test]
fn test_missing_function_error_uses_key_label() {
    let mut loader = runtime_loader();
    let err = loader.get_kernel_function("reduce", "scan").err().expect("scan is missing");
    let message = err.to_string();
    assert!(message.contains("'scan'"));
    assert!(message.contains("inline:"));
    assert!(!message.contains("reduce"));
}

#[test]
fn test_archive_failures_are_not_cached() {
    let mut loader = runtime_loader();
    let path = PathBuf::from("/nonexistent/kernels.metallib");
    let key = path.to_str().expect("utf-8");
    assert!(matches!(loader.import_metallib(key), Err(LoaderError::Compile(_))));
    assert!(matches!(loader.import(key, BuildMode::Runtime), Err(LoaderError::Compile(_))));
    assert!(loader.cache().is_empty());
    assert_eq!(loader.metrics().misses, 2);
}

#[test]
fn test_default_loader_builds_xcrun_from_config() {
    let config = LoaderConfig::default().with_toolchain_program("/usr/local/bin/xcrun");
    let loader = LibraryLoader::new(ListDevice::default(), config);
    assert_eq!(loader.toolchain().config().program, "/usr/local/bin/xcrun");
    assert_eq!(loader.config().build_mode, BuildMode::Toolchain);
}
