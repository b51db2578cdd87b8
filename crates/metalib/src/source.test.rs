#![cfg(test)]

use super::*;

#[test]
fn test_classify_recognised_suffixes() {
    assert_eq!(classify("shaders/blur.metal"), SourceKind::SourceFile);
    assert_eq!(classify("shaders/quad.frag"), SourceKind::SourceFile);
    assert_eq!(classify("shaders/quad.vert"), SourceKind::SourceFile);
    assert_eq!(classify("build/default.metallib"), SourceKind::Archive);
    assert_eq!(classify("build/blur.air"), SourceKind::Archive);
    assert_eq!(classify("ir/blur.spv"), SourceKind::Spirv);
}

#[test]
fn test_classify_falls_back_to_inline() {
    assert_eq!(classify(""), SourceKind::Inline);
    assert_eq!(classify("Makefile"), SourceKind::Inline);
    assert_eq!(classify("#include <metal_stdlib>\nkernel void k(){}"), SourceKind::Inline);
    assert_eq!(classify(".metal.bak"), SourceKind::Inline);
}

#[test]
fn test_classify_is_case_sensitive() {
    assert_eq!(classify("BLUR.METAL"), SourceKind::Inline);
    assert_eq!(classify("default.MetalLib"), SourceKind::Inline);
    assert_eq!(classify("ir/blur.SPV"), SourceKind::Inline);
}

#[test]
fn test_key_label_hashes_inline_text() {
    let program = "kernel void k(){}";
    let label = key_label(program);
    assert!(label.starts_with("inline:"));
    assert_eq!(label.len(), "inline:".len() + 16);
    assert_eq!(label, key_label(program));
    assert_ne!(label, key_label("kernel void j(){}"));

    assert_eq!(key_label("a.metallib"), "a.metallib");
    assert!(matches!(key_label("ir/blur.spv"), Cow::Borrowed(_)));
}
