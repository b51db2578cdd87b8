#![cfg(test)]

use rand::{Rng, SeedableRng, rngs::StdRng};

use super::*;

fn encode_le(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|word| word.to_le_bytes()).collect()
}

#[test]
fn test_round_trip_word_counts() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for count in [0usize, 1, 1000] {
        let words: Vec<u32> = (0..count).map(|_| rng.random()).collect();
        let decoded = decode_words(&encode_le(&words)).expect("aligned stream decodes");
        assert_eq!(decoded, words, "round trip of {count} words");
    }
}

#[test]
fn test_empty_stream_has_no_words() {
    assert!(decode_words(&[]).expect("empty is aligned").is_empty());
}

#[test]
fn test_trailing_bytes_are_rejected() {
    let mut bytes = encode_le(&[SPIRV_MAGIC, 0x0001_0000]);
    bytes.push(0xff);
    match decode_words(&bytes) {
        Err(LoaderError::MisalignedSpirv { len }) => assert_eq!(len, 9),
        other => panic!("expected misaligned error, got {other:?}"),
    }
    assert!(matches!(decode_words(&[1, 2, 3]), Err(LoaderError::MisalignedSpirv { len: 3 })));
}

#[test]
fn test_swapped_magic_is_not_reinterpreted() {
    let words = [SPIRV_MAGIC.swap_bytes(), 1];
    assert_eq!(decode_words(&encode_le(&words)).expect("decodes"), [0x0302_2307, 1]);
}

#[test]
fn test_read_missing_file() {
    let path = std::env::temp_dir().join("metalib-does-not-exist.spv");
    assert!(matches!(read_spirv_file(&path), Err(LoaderError::FileNotFound { .. })));
}
