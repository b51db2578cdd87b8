#![cfg(test)]

use super::*;

fn toolchain(program: &str) -> XcrunToolchain {
    XcrunToolchain::new(ToolchainConfig {
        program: program.to_owned(),
        ..ToolchainConfig::default()
    })
}

#[test]
fn test_missing_program_reports_spawn_failure() {
    let toolchain = toolchain("metalib-no-such-compiler");
    let output = std::env::temp_dir().join("metalib-spawn-test.metallib");
    match toolchain.compile(ToolchainInput::Stdin("kernel void k(){}"), &output) {
        Err(LoaderError::ToolchainSpawn { program, .. }) => assert_eq!(program, "metalib-no-such-compiler"),
        other => panic!("expected spawn failure, got {other:?}"),
    }
    assert!(!output.exists());
}

/// MSL-looking text much larger than any default pipe buffer.
fn oversized_program() -> String {
    "// padding the program past the pipe buffer\n".repeat(100_000)
}

#[cfg(unix)]
#[test]
fn test_exit_codes_are_reported() {
    let run = toolchain("true")
        .compile(ToolchainInput::File(Path::new("blur.metal")), Path::new("/dev/null"))
        .expect("true runs");
    assert_eq!(run, ToolchainRun { stdin_bytes: 0, exit_code: Some(0) });

    let run = toolchain("false")
        .compile(ToolchainInput::File(Path::new("blur.metal")), Path::new("/dev/null"))
        .expect("false runs");
    assert_eq!(run, ToolchainRun { stdin_bytes: 0, exit_code: Some(1) });
}

#[cfg(unix)]
#[test]
fn test_child_that_never_reads_stdin_yields_a_short_write() {
    // `true` exits without reading, so once the pipe buffer fills the write fails.
    let source = oversized_program();
    assert!(source.len() > 128 * 1024);
    let run = toolchain("true")
        .compile(ToolchainInput::Stdin(&source), Path::new("/dev/null"))
        .expect("true runs");
    assert_eq!(run.exit_code, Some(0));
    assert!(run.stdin_bytes < source.len(), "wrote {} of {}", run.stdin_bytes, source.len());
}
