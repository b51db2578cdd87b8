#![cfg(test)]

use super::*;

#[test]
fn test_artifact_name_shape() {
    let dir = std::env::temp_dir();
    let a = TempArtifact::new(&dir);
    let b = TempArtifact::new(&dir);

    assert_eq!(a.path().parent(), Some(dir.as_path()));
    let name = a.path().file_name().and_then(|n| n.to_str()).expect("utf-8 name");
    assert!(name.starts_with("mtl-"));
    assert!(name.ends_with(".metallib"));
    assert!(name["mtl-".len()..name.len() - ".metallib".len()].parse::<u64>().is_ok());
    assert_ne!(a.path(), b.path());
}

#[test]
fn test_drop_removes_written_file() {
    let artifact = TempArtifact::new(&std::env::temp_dir());
    let path = artifact.path().to_path_buf();
    std::fs::write(&path, b"compiled").expect("write artifact");
    assert!(path.exists());

    drop(artifact);
    assert!(!path.exists());
}

#[test]
fn test_drop_tolerates_missing_file() {
    let artifact = TempArtifact::new(&std::env::temp_dir());
    let path = artifact.path().to_path_buf();
    drop(artifact);
    assert!(!path.exists());
}
