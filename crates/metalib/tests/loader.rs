mod common;

use std::ptr;

use common::{StubDevice, scratch_dir, stub_loader};
use metalib::{
    BuildMode, CacheMetrics, Library, LibraryLoader, LoaderConfig, LoaderError, ToolchainConfig, XcrunToolchain, key_label,
};

const ADD: &str = "kernel void add(device float* a [[buffer(0)]]) {}";
const SCALE: &str = "kernel void scale(device float* a [[buffer(0)]]) {}";

#[test]
fn repeated_imports_reuse_the_cached_library() {
    let dir = scratch_dir("idempotent");
    let mut loader = stub_loader(&dir, BuildMode::Runtime);

    let first: *const _ = loader.import_source_string(ADD, BuildMode::Runtime).expect("compiles");
    let second: *const _ = loader.import_source_string(ADD, BuildMode::Runtime).expect("cached");
    assert!(ptr::eq(first, second));
    assert_eq!(loader.device().compiles(), 1);

    let first: *const _ = loader.import_source_string(SCALE, BuildMode::Toolchain).expect("compiles");
    let second: *const _ = loader.import(SCALE, BuildMode::Toolchain).expect("cached");
    assert!(ptr::eq(first, second));
    assert_eq!(loader.toolchain().invocations(), 1);
    assert_eq!(loader.device().loads(), 1);

    // The cache key ignores the build mode.
    loader.import_source_string(ADD, BuildMode::Toolchain).expect("cached");
    assert_eq!(loader.toolchain().invocations(), 1);
    assert_eq!(loader.metrics(), CacheMetrics { size: 2, hits: 3, misses: 2 });
}

#[test]
fn inline_program_end_to_end() {
    let dir = scratch_dir("inline");
    let mut loader = stub_loader(&dir, BuildMode::Runtime);
    let program = "#include <stdlib>\nkernel void k(){}";

    let library = loader.import(program, BuildMode::Runtime).expect("compiles");
    assert_eq!(library.function_names(), ["k"]);

    let function = loader.get_kernel_function(program, "k").expect("k exists");
    assert_eq!(function.name, "k");
    match loader.get_kernel_function(program, "missing") {
        Err(LoaderError::FunctionNotFound { library, function }) => {
            assert_eq!(library, key_label(program));
            assert_eq!(function, "missing");
        }
        other => panic!("expected missing function, got {other:?}"),
    }

    assert_eq!(loader.device().compiles(), 1);
    let options = loader.device().last_options().expect("compiled in process");
    assert!(options.fast_math);
    assert_eq!(options.language_version.to_string(), "2.4");
}

#[test]
fn importing_another_key_leaves_existing_entries_alone() {
    let dir = scratch_dir("isolation");
    let mut loader = stub_loader(&dir, BuildMode::Runtime);

    let first: *const _ = loader.import_source_string(ADD, BuildMode::Runtime).expect("compiles");
    loader.import_source_string(SCALE, BuildMode::Runtime).expect("compiles");

    let cached = loader.cache().lookup(ADD).expect("still cached");
    assert!(ptr::eq(first, cached));
    assert_eq!(cached.function_names(), ["add"]);
    assert_eq!(loader.cache().len(), 2);
}

#[test]
fn failed_imports_are_not_cached() {
    let dir = scratch_dir("retry");
    let path = dir.join("late.metal");
    let key = path.to_str().expect("utf-8 path");

    for mode in [BuildMode::Runtime, BuildMode::Toolchain] {
        let mut loader = stub_loader(&dir, mode);
        assert!(matches!(loader.import_source_file(key, mode), Err(LoaderError::FileNotFound { .. })));
        assert!(loader.cache().is_empty());
        assert_eq!(loader.device().compiles(), 0);
        assert_eq!(loader.toolchain().invocations(), 0);
    }

    std::fs::write(&path, "kernel void late(){}").expect("write source");
    for mode in [BuildMode::Runtime, BuildMode::Toolchain] {
        let mut loader = stub_loader(&dir, mode);
        let library = loader.import(key, mode).expect("retry succeeds");
        assert_eq!(library.function_names(), ["late"]);
    }
}

#[test]
fn compile_diagnostics_surface_and_do_not_cache() {
    let dir = scratch_dir("diagnostic");
    let mut loader = stub_loader(&dir, BuildMode::Runtime);
    let broken = "#error not yet\nkernel void k(){}";

    match loader.import_source_string(broken, BuildMode::Runtime) {
        Err(LoaderError::Compile(err)) => {
            assert_eq!(err.description, "Compilation failed");
            assert!(err.failure_reason.is_some());
        }
        other => panic!("expected compile failure, got {other:?}"),
    }
    assert!(!loader.cache().contains(broken));

    let missing = dir.join("absent.metallib");
    let err = loader
        .import_metallib(missing.to_str().expect("utf-8 path"))
        .expect_err("archive does not exist");
    assert!(matches!(err, LoaderError::Compile(_)));
    assert!(loader.cache().is_empty());
}

#[test]
fn non_utf8_source_file_is_reported_as_such() {
    let dir = scratch_dir("non-utf8");
    let path = dir.join("latin1.metal");
    std::fs::write(&path, b"// caf\xe9\nkernel void k(){}").expect("write source");
    let key = path.to_str().expect("utf-8 path");
    let mut loader = stub_loader(&dir, BuildMode::Runtime);

    match loader.import_source_file(key, BuildMode::Runtime) {
        Err(err @ LoaderError::SourceNotUtf8 { .. }) => assert!(err.to_string().contains("not valid UTF-8")),
        other => panic!("expected a UTF-8 error, got {other:?}"),
    }
    assert_eq!(loader.device().compiles(), 0);
    assert!(loader.cache().is_empty());

    let missing = dir.join("missing.metal");
    let err = loader
        .import_source_file(missing.to_str().expect("utf-8 path"), BuildMode::Runtime)
        .expect_err("file does not exist");
    assert!(matches!(err, LoaderError::FileNotFound { .. }));
}

#[test]
fn short_toolchain_write_skips_the_artifact_load() {
    let dir = scratch_dir("short-write");
    let mut loader = stub_loader(&dir, BuildMode::Toolchain);
    loader.toolchain().set_short_write(true);

    match loader.import_source_string(ADD, BuildMode::Toolchain) {
        Err(LoaderError::ToolchainIo { written, expected }) => {
            assert_eq!(expected, ADD.len());
            assert!(written < expected);
        }
        other => panic!("expected toolchain io failure, got {other:?}"),
    }
    assert_eq!(loader.device().loads(), 0);
    assert!(loader.cache().is_empty());
    let outputs = loader.toolchain().outputs();
    assert_eq!(outputs.len(), 1);
    assert!(!outputs[0].exists(), "partial artifact must be removed");
}

#[cfg(unix)]
#[test]
fn real_toolchain_that_stops_reading_is_an_io_error() {
    let dir = scratch_dir("real-short-write");
    let toolchain = XcrunToolchain::new(ToolchainConfig {
        program: "true".to_owned(),
        ..ToolchainConfig::default()
    });
    let config = LoaderConfig::default().with_artifact_dir(&dir);
    let mut loader = LibraryLoader::with_toolchain(StubDevice::default(), toolchain, config);
    let program = format!("{}{ADD}", "// filler line that the compiler never gets to read\n".repeat(50_000));

    match loader.import_source_string(&program, BuildMode::Toolchain) {
        Err(LoaderError::ToolchainIo { written, expected }) => {
            assert_eq!(expected, program.len());
            assert!(written < expected);
        }
        other => panic!("expected toolchain io failure, got {other:?}"),
    }
    assert_eq!(loader.device().loads(), 0);
    assert!(loader.cache().is_empty());
}

#[test]
fn toolchain_artifacts_are_loaded_then_removed() {
    let dir = scratch_dir("artifacts");
    let source_path = dir.join("blur.metal");
    std::fs::write(&source_path, "kernel void blur(){}").expect("write source");
    let mut loader = stub_loader(&dir, BuildMode::Toolchain);

    loader.import_source_string(ADD, BuildMode::Toolchain).expect("stdin compile");
    let source_key = source_path.to_str().expect("utf-8 path");
    let library = loader.import(source_key, BuildMode::Toolchain).expect("file compile");
    assert_eq!(library.function_names(), ["blur"]);

    let toolchain = loader.toolchain();
    assert_eq!(toolchain.inputs(), ["-".to_owned(), source_key.to_owned()]);
    for artifact in toolchain.outputs() {
        assert_eq!(artifact.parent(), Some(dir.as_path()));
        assert!(!artifact.exists());
    }
    assert_eq!(loader.device().loads(), 2);
    assert_eq!(loader.device().compiles(), 0);
}

#[test]
fn search_visits_libraries_in_key_order() {
    let dir = scratch_dir("search");
    let a = dir.join("a.metallib");
    let b = dir.join("b.metallib");
    std::fs::write(&a, "kernel void foo(){}").expect("write a");
    std::fs::write(&b, "kernel void bar(){}\nkernel void foo(){}").expect("write b");

    let mut loader = stub_loader(&dir, BuildMode::Toolchain);
    loader.import(b.to_str().expect("utf-8"), BuildMode::Toolchain).expect("load b");
    loader.import(a.to_str().expect("utf-8"), BuildMode::Toolchain).expect("load a");
    let loads = loader.device().loads();

    assert_eq!(loader.find_kernel_function("foo").map(|f| f.origin), Some("a.metallib".to_owned()));
    assert_eq!(loader.find_kernel_function("bar").map(|f| f.origin), Some("b.metallib".to_owned()));
    assert!(loader.find_kernel_function("missing").is_none());
    assert_eq!(loader.device().loads(), loads);
    assert_eq!(loader.toolchain().invocations(), 0);
}

#[test]
fn import_dispatches_on_suffix() {
    let dir = scratch_dir("dispatch");
    let archive = dir.join("prebuilt.air");
    let source = dir.join("quad.vert");
    std::fs::write(&archive, "kernel void prebuilt(){}").expect("write archive");
    std::fs::write(&source, "kernel void quad(){}").expect("write source");
    let mut loader = stub_loader(&dir, BuildMode::Runtime);

    loader.import(archive.to_str().expect("utf-8"), BuildMode::Runtime).expect("archive");
    assert_eq!((loader.device().loads(), loader.device().compiles()), (1, 0));

    loader.import(source.to_str().expect("utf-8"), BuildMode::Runtime).expect("source file");
    assert_eq!((loader.device().loads(), loader.device().compiles()), (1, 1));

    loader.import("kernel void inline_k(){}", BuildMode::Runtime).expect("inline");
    assert_eq!((loader.device().loads(), loader.device().compiles()), (1, 2));
    assert_eq!(loader.device().last_source().as_deref(), Some("kernel void inline_k(){}"));
    assert_eq!(loader.cache().len(), 3);
}

#[test]
fn dump_lists_functions_with_stage_inputs() {
    let dir = scratch_dir("dump");
    let mut loader = stub_loader(&dir, BuildMode::Runtime);
    let program = "kernel void blend(float4 color [[attribute(0)]], float2 uv [[attribute(1)]]) {}\nkernel void clear() {}";
    loader.import(program, BuildMode::Runtime).expect("compiles");

    let expected = format!("* {}: \n   * blend:   color, uv, \n   * clear:   \n", key_label(program));
    assert_eq!(loader.to_string(), expected);
    assert_eq!(loader.cache().len(), 1);
}
