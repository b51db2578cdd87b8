mod common;

use std::path::Path;

use common::{scratch_dir, stub_loader};
use metalib::{BuildMode, Library, LoaderError, spirv::STUB_SOURCE};
use naga::valid::{Capabilities, ValidationFlags, Validator};

const SAXPY_WGSL: &str = r#"
struct Params {
    alpha: f32,
}

@group(0) @binding(0) var<uniform> params: Params;
@group(0) @binding(1) var<storage, read> xs: array<f32>;
@group(0) @binding(2) var<storage, read_write> ys: array<f32>;

@compute @workgroup_size(64)
fn saxpy(@builtin(global_invocation_id) id: vec3<u32>) {
    ys[id.x] = params.alpha * xs[id.x] + ys[id.x];
}
"#;

fn write_spirv(path: &Path, wgsl: &str) {
    let module = naga::front::wgsl::parse_str(wgsl).expect("wgsl parses");
    let info = Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .expect("wgsl validates");
    let words = naga::back::spv::write_vec(&module, &info, &naga::back::spv::Options::default(), None).expect("spirv emits");
    let bytes: Vec<u8> = words.iter().flat_map(|word| word.to_le_bytes()).collect();
    std::fs::write(path, bytes).expect("write spirv");
}

#[test]
fn spirv_is_translated_and_compiled_in_process() {
    let dir = scratch_dir("spirv-runtime");
    let path = dir.join("saxpy.spv");
    write_spirv(&path, SAXPY_WGSL);
    let key = path.to_str().expect("utf-8 path");

    let mut loader = stub_loader(&dir, BuildMode::Runtime);
    let library = loader.import_spirv(key, BuildMode::Runtime).expect("translates");
    assert_eq!(library.function_names(), ["saxpy"]);

    let source = loader.device().last_source().expect("compiled in process");
    assert!(source.contains("#include <metal_stdlib>"));
    assert!(loader.get_kernel_function(key, "saxpy").is_ok());
    assert_eq!(loader.device().compiles(), 1);
}

#[test]
fn spirv_goes_through_the_toolchain_by_default() {
    let dir = scratch_dir("spirv-toolchain");
    let path = dir.join("saxpy.spv");
    write_spirv(&path, SAXPY_WGSL);
    let key = path.to_str().expect("utf-8 path");

    let mut loader = stub_loader(&dir, BuildMode::Toolchain);
    let function = loader.get_kernel_function(key, "saxpy").expect("resolves");
    assert_eq!(function.name, "saxpy");
    assert_eq!(loader.toolchain().inputs(), ["-"]);
    assert_eq!(loader.device().loads(), 1);
}

#[test]
fn untranslatable_spirv_compiles_to_an_empty_library() {
    let dir = scratch_dir("spirv-garbage");
    let path = dir.join("garbage.spv");
    let bytes: Vec<u8> = [0xdead_beef_u32, 1, 2, 3].iter().flat_map(|word| word.to_le_bytes()).collect();
    std::fs::write(&path, bytes).expect("write garbage");
    let key = path.to_str().expect("utf-8 path");

    let mut loader = stub_loader(&dir, BuildMode::Runtime);
    let library = loader.import(key, BuildMode::Runtime).expect("stub compiles");
    assert!(library.function_names().is_empty());
    assert_eq!(loader.device().last_source().as_deref(), Some(STUB_SOURCE));
    assert!(matches!(
        loader.get_kernel_function(key, "main"),
        Err(LoaderError::FunctionNotFound { .. })
    ));
}

#[test]
fn misaligned_spirv_is_rejected_before_compiling() {
    let dir = scratch_dir("spirv-misaligned");
    let path = dir.join("short.spv");
    std::fs::write(&path, [0x03, 0x02, 0x23, 0x07, 0x00]).expect("write");
    let key = path.to_str().expect("utf-8 path");

    let mut loader = stub_loader(&dir, BuildMode::Runtime);
    assert!(matches!(
        loader.import_spirv(key, BuildMode::Runtime),
        Err(LoaderError::MisalignedSpirv { len: 5 })
    ));
    assert!(loader.cache().is_empty());
    assert_eq!(loader.device().compiles(), 0);

    let missing = dir.join("missing.spv");
    assert!(matches!(
        loader.import_spirv(missing.to_str().expect("utf-8"), BuildMode::Runtime),
        Err(LoaderError::FileNotFound { .. })
    ));
}
