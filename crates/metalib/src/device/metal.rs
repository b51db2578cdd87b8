//! [`Device`] implementation over the system Metal framework.

use std::path::Path;

use objc2::{rc::Retained, runtime::ProtocolObject};
use objc2_foundation::{NSError, NSString, NSURL};
use objc2_metal::{
    MTLCompileOptions, MTLCreateSystemDefaultDevice, MTLDevice, MTLFunction, MTLLanguageVersion, MTLLibrary,
};

use super::{CompileOptions, Device, Function, LanguageVersion, Library};
use crate::error::{DeviceError, LoaderError};

#[derive(Clone, Debug)]
pub struct MetalDevice(Retained<ProtocolObject<dyn MTLDevice>>);

unsafe impl Send for MetalDevice {}
unsafe impl Sync for MetalDevice {}

impl std::ops::Deref for MetalDevice {
    type Target = ProtocolObject<dyn MTLDevice>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl MetalDevice {
    pub fn system_default() -> Result<Self, LoaderError> {
        MTLCreateSystemDefaultDevice().map(Self).ok_or(LoaderError::DeviceNotFound)
    }

    pub fn from_raw(device: Retained<ProtocolObject<dyn MTLDevice>>) -> Self {
        Self(device)
    }
}

impl Device for MetalDevice {
    type Library = MetalLibrary;
    type Function = MetalFunction;

    fn new_library_with_file(&self, path: &Path) -> Result<MetalLibrary, DeviceError> {
        let path = path.to_str().ok_or_else(|| DeviceError::new(format!("Library path is not UTF-8: {}", path.display())))?;
        let url = NSURL::fileURLWithPath(&NSString::from_str(path));
        self.0.newLibraryWithURL_error(&url).map(MetalLibrary).map_err(|err| device_error(&err))
    }

    fn new_library_with_source(&self, source: &str, options: &CompileOptions) -> Result<MetalLibrary, DeviceError> {
        let compile_options = MTLCompileOptions::new();
        #[allow(deprecated)]
        compile_options.setFastMathEnabled(options.fast_math);
        compile_options.setLanguageVersion(language_version(options.language_version)?);

        let source = NSString::from_str(source);
        self.0
            .newLibraryWithSource_options_error(&source, Some(&compile_options))
            .map(MetalLibrary)
            .map_err(|err| device_error(&err))
    }
}

#[derive(Clone, Debug)]
pub struct MetalLibrary(Retained<ProtocolObject<dyn MTLLibrary>>);

unsafe impl Send for MetalLibrary {}
unsafe impl Sync for MetalLibrary {}

impl std::ops::Deref for MetalLibrary {
    type Target = ProtocolObject<dyn MTLLibrary>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Library for MetalLibrary {
    type Function = MetalFunction;

    fn function_names(&self) -> Vec<String> {
        self.0.functionNames().iter().map(|name| name.to_string()).collect()
    }

    fn new_function(&self, name: &str) -> Option<MetalFunction> {
        self.0.newFunctionWithName(&NSString::from_str(name)).map(MetalFunction)
    }
}

/// A function handle. It retains its own reference and outlives the library it came from.
#[derive(Clone, Debug)]
pub struct MetalFunction(Retained<ProtocolObject<dyn MTLFunction>>);

unsafe impl Send for MetalFunction {}
unsafe impl Sync for MetalFunction {}

impl std::ops::Deref for MetalFunction {
    type Target = ProtocolObject<dyn MTLFunction>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Function for MetalFunction {
    fn name(&self) -> String {
        self.0.name().to_string()
    }

    fn stage_input_attributes(&self) -> Vec<String> {
        self.0
            .stageInputAttributes()
            .map(|attributes| attributes.iter().map(|attribute| attribute.name().to_string()).collect())
            .unwrap_or_default()
    }
}

fn device_error(err: &NSError) -> DeviceError {
    DeviceError {
        description: err.localizedDescription().to_string(),
        failure_reason: err.localizedFailureReason().map(|reason| reason.to_string()),
    }
}

fn language_version(version: LanguageVersion) -> Result<MTLLanguageVersion, DeviceError> {
    Ok(match (version.major, version.minor) {
        (2, 0) => MTLLanguageVersion::Version2_0,
        (2, 1) => MTLLanguageVersion::Version2_1,
        (2, 2) => MTLLanguageVersion::Version2_2,
        (2, 3) => MTLLanguageVersion::Version2_3,
        (2, 4) => MTLLanguageVersion::Version2_4,
        (3, 0) => MTLLanguageVersion::Version3_0,
        (3, 1) => MTLLanguageVersion::Version3_1,
        _ => return Err(DeviceError::new(format!("Unsupported Metal language version {version}"))),
    })
}
