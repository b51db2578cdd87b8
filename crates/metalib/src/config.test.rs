#![cfg(test)]

use metalib_env::{Environment, LoaderEnvVar};
use serial_test::serial;

use super::*;

#[test]
fn test_default_toolchain_command_line() {
    let config = ToolchainConfig::default();
    let args = config.args(OsStr::new("-"), Path::new("/tmp/mtl-7.metallib"));
    let expected: Vec<OsString> = [
        "-sdk",
        "macosx",
        "metal",
        "-std=macos-metal2.4",
        "-xmetal",
        "-Ofast",
        "-o",
        "/tmp/mtl-7.metallib",
        "-",
    ]
    .into_iter()
    .map(OsString::from)
    .collect();
    assert_eq!(args, expected);
}

#[test]
fn test_language_version_pins_both_paths() {
    let config = LoaderConfig::default().with_language_version(LanguageVersion::new(3, 1));
    assert_eq!(config.compile_options.language_version, LanguageVersion::new(3, 1));
    let args = config.toolchain.args(OsStr::new("blur.metal"), Path::new("out.metallib"));
    assert_eq!(args[3], OsString::from("-std=macos-metal3.1"));
    assert_eq!(args.last(), Some(&OsString::from("blur.metal")));
}

#[test]
fn test_defaults() {
    let config = LoaderConfig::default();
    assert_eq!(config.build_mode, BuildMode::Toolchain);
    assert!(config.compile_options.fast_math);
    assert_eq!(config.compile_options.language_version, LanguageVersion::V2_4);
    assert_eq!(config.artifact_dir, std::env::temp_dir());
}

#[test]
#[serial]
fn test_from_env_overrides() {
    let _runtime = Environment::scoped(LoaderEnvVar::RuntimeBuild, Some("1"));
    let _program = Environment::scoped(LoaderEnvVar::Toolchain, Some("/opt/metal/bin/xcrun"));
    let _sdk = Environment::scoped(LoaderEnvVar::ToolchainSdk, Some("iphoneos"));
    let _dir = Environment::scoped(LoaderEnvVar::ArtifactDir, Some("/var/tmp/metalib"));

    let config = LoaderConfig::from_env().expect("valid overrides");
    assert_eq!(config.build_mode, BuildMode::Runtime);
    assert_eq!(config.toolchain.program, "/opt/metal/bin/xcrun");
    assert_eq!(config.toolchain.sdk, "iphoneos");
    assert_eq!(config.toolchain.optimization, "-Ofast");
    assert_eq!(config.artifact_dir, PathBuf::from("/var/tmp/metalib"));
}

#[test]
#[serial]
fn test_from_env_rejects_bad_flag() {
    let _runtime = Environment::scoped(LoaderEnvVar::RuntimeBuild, Some("sometimes"));
    assert!(matches!(LoaderConfig::from_env(), Err(LoaderError::Config(_))));
}

#[test]
#[serial]
fn test_from_env_without_overrides_matches_default() {
    let _guards = [
        Environment::scoped(LoaderEnvVar::RuntimeBuild, None),
        Environment::scoped(LoaderEnvVar::Toolchain, None),
        Environment::scoped(LoaderEnvVar::ToolchainSdk, None),
        Environment::scoped(LoaderEnvVar::ArtifactDir, None),
    ];
    assert_eq!(LoaderConfig::from_env().expect("empty env"), LoaderConfig::default());
}
