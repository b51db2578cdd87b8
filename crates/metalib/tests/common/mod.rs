#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use metalib::{
    BuildMode, CompileOptions, Device, DeviceError, Function, Library, LibraryLoader, LoaderConfig, LoaderError, Toolchain,
    ToolchainInput, ToolchainRun,
};

/// Device that "compiles" MSL by scanning for `kernel void NAME(` and counts every call.
#[derive(Default)]
pub struct StubDevice {
    compiles: Cell<usize>,
    loads: Cell<usize>,
    last_source: RefCell<Option<String>>,
    last_options: Cell<Option<CompileOptions>>,
}

impl StubDevice {
    pub fn compiles(&self) -> usize {
        self.compiles.get()
    }

    pub fn loads(&self) -> usize {
        self.loads.get()
    }

    pub fn last_source(&self) -> Option<String> {
        self.last_source.borrow().clone()
    }

    pub fn last_options(&self) -> Option<CompileOptions> {
        self.last_options.get()
    }
}

impl Device for StubDevice {
    type Library = StubLibrary;
    type Function = StubFunction;

    fn new_library_with_file(&self, path: &Path) -> Result<StubLibrary, DeviceError> {
        self.loads.set(self.loads.get() + 1);
        let text = std::fs::read_to_string(path).map_err(|err| {
            DeviceError::new(format!("Failed to open library {}", path.display())).with_failure_reason(err.to_string())
        })?;
        let origin = path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
        StubLibrary::parse(&text, &origin)
    }

    fn new_library_with_source(&self, source: &str, options: &CompileOptions) -> Result<StubLibrary, DeviceError> {
        self.compiles.set(self.compiles.get() + 1);
        *self.last_source.borrow_mut() = Some(source.to_owned());
        self.last_options.set(Some(*options));
        StubLibrary::parse(source, "source")
    }
}

#[derive(Debug)]
pub struct StubLibrary {
    pub origin: String,
    functions: Vec<StubFunction>,
}

impl StubLibrary {
    fn parse(source: &str, origin: &str) -> Result<Self, DeviceError> {
        if source.contains("#error") {
            return Err(DeviceError::new("Compilation failed").with_failure_reason("program contains an #error directive"));
        }
        let mut functions = Vec::new();
        for (index, _) in source.match_indices("kernel void ") {
            let rest = &source[index + "kernel void ".len()..];
            let Some(open) = rest.find('(') else { continue };
            let name = rest[..open].trim();
            if name.is_empty() {
                continue;
            }
            let params = &rest[open + 1..open + 1 + closing_paren(&rest[open + 1..])];
            let attributes = params
                .split(',')
                .filter(|param| param.contains("[[attribute("))
                .filter_map(|param| param.split("[[").next()?.split_whitespace().last().map(str::to_owned))
                .collect();
            functions.push(StubFunction {
                name: name.to_owned(),
                origin: origin.to_owned(),
                attributes,
            });
        }
        Ok(Self {
            origin: origin.to_owned(),
            functions,
        })
    }
}

/// Offset of the `)` closing an already opened parenthesis.
fn closing_paren(text: &str) -> usize {
    let mut depth = 1usize;
    for (offset, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return offset;
                }
            }
            _ => {}
        }
    }
    text.len()
}

impl Library for StubLibrary {
    type Function = StubFunction;

    fn function_names(&self) -> Vec<String> {
        self.functions.iter().map(|function| function.name.clone()).collect()
    }

    fn new_function(&self, name: &str) -> Option<StubFunction> {
        self.functions.iter().find(|function| function.name == name).cloned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubFunction {
    pub name: String,
    pub origin: String,
    attributes: Vec<String>,
}

impl Function for StubFunction {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn stage_input_attributes(&self) -> Vec<String> {
        self.attributes.clone()
    }
}

/// Toolchain that copies its input into the artifact instead of compiling it.
#[derive(Default)]
pub struct StubToolchain {
    short_write: Cell<bool>,
    inputs: RefCell<Vec<String>>,
    outputs: RefCell<Vec<PathBuf>>,
}

impl StubToolchain {
    /// Make stdin runs report that only half the program was accepted.
    pub fn set_short_write(&self, short: bool) {
        self.short_write.set(short);
    }

    pub fn invocations(&self) -> usize {
        self.outputs.borrow().len()
    }

    /// `"-"` for stdin runs, otherwise the source path.
    pub fn inputs(&self) -> Vec<String> {
        self.inputs.borrow().clone()
    }

    pub fn outputs(&self) -> Vec<PathBuf> {
        self.outputs.borrow().clone()
    }
}

impl Toolchain for StubToolchain {
    fn compile(&self, input: ToolchainInput<'_>, output: &Path) -> Result<ToolchainRun, LoaderError> {
        self.outputs.borrow_mut().push(output.to_path_buf());
        let io_error = |source| LoaderError::ToolchainSpawn {
            program: "stub".to_owned(),
            source,
        };
        let stdin_bytes = match input {
            ToolchainInput::Stdin(source) => {
                self.inputs.borrow_mut().push("-".to_owned());
                let accepted = if self.short_write.get() { source.len() / 2 } else { source.len() };
                std::fs::write(output, &source.as_bytes()[..accepted]).map_err(io_error)?;
                accepted
            }
            ToolchainInput::File(path) => {
                self.inputs.borrow_mut().push(path.display().to_string());
                std::fs::copy(path, output).map_err(io_error)?;
                0
            }
        };
        Ok(ToolchainRun {
            stdin_bytes,
            exit_code: Some(0),
        })
    }
}

pub type StubLoader = LibraryLoader<StubDevice, StubToolchain>;

/// Fresh, empty directory under the system temp dir.
pub fn scratch_dir(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("metalib-{tag}-{}-{nanos}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

/// Loader over the stub device and toolchain, writing artifacts into `dir`.
pub fn stub_loader(dir: &Path, mode: BuildMode) -> StubLoader {
    let config = LoaderConfig::default().with_build_mode(mode).with_artifact_dir(dir);
    LibraryLoader::with_toolchain(StubDevice::default(), StubToolchain::default(), config)
}
