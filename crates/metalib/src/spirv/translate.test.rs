#![cfg(test)]

use naga::valid::{Capabilities, ValidationFlags, Validator};

use super::*;
use crate::spirv::SPIRV_MAGIC;

const DOUBLE_WGSL: &str = r#"
@group(0) @binding(0)
var<storage, read_write> values: array<f32>;

@compute @workgroup_size(64)
fn double_values(@builtin(global_invocation_id) id: vec3<u32>) {
    values[id.x] = values[id.x] * 2.0;
}
"#;

fn spirv_words(wgsl: &str) -> Vec<u32> {
    let module = naga::front::wgsl::parse_str(wgsl).expect("wgsl parses");
    let info = Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .expect("wgsl validates");
    naga::back::spv::write_vec(&module, &info, &naga::back::spv::Options::default(), None).expect("spirv emits")
}

#[test]
fn test_translates_compute_entry_point() {
    let words = spirv_words(DOUBLE_WGSL);
    assert_eq!(words[0], SPIRV_MAGIC);

    let translation = translate_to_msl(&words, LanguageVersion::V2_4);
    let Translation::Source(source) = translation else {
        panic!("expected translated source, got {translation:?}");
    };
    assert!(source.contains("metal_stdlib"));
    assert!(source.contains("kernel void double_values"));
}

#[test]
fn test_byte_swapped_module_translates() {
    let swapped: Vec<u32> = spirv_words(DOUBLE_WGSL).iter().map(|word| word.swap_bytes()).collect();
    assert_eq!(swapped[0], SPIRV_MAGIC.swap_bytes());
    assert!(matches!(host_order(&swapped), Cow::Owned(_)));

    let translation = translate_to_msl(&swapped, LanguageVersion::V2_4);
    let Translation::Source(source) = translation else {
        panic!("expected translated source, got {translation:?}");
    };
    assert!(source.contains("kernel void double_values"));
}

#[test]
fn test_host_order_module_is_borrowed() {
    let words = spirv_words(DOUBLE_WGSL);
    assert!(matches!(host_order(&words), Cow::Borrowed(_)));
}

#[test]
fn test_empty_words_fall_back_to_stub() {
    let translation = translate_to_msl(&[], LanguageVersion::V2_4);
    assert!(translation.is_stub());
    assert_eq!(translation.into_source(), STUB_SOURCE);
}

#[test]
fn test_garbage_words_fall_back_to_stub() {
    let translation = translate_to_msl(&[0xdead_beef, 1, 2, 3, 4, 5], LanguageVersion::V2_4);
    match &translation {
        Translation::Stub { reason } => assert!(reason.starts_with("parse")),
        other => panic!("expected stub, got {other:?}"),
    }
    assert_eq!(translation.into_source(), "#include <metal_stdlib>\n");
}
