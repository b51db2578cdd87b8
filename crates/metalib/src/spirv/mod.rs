//! SPIR-V ingestion: word decoding and translation to MSL.

mod decode;
mod translate;

pub use decode::{SPIRV_MAGIC, decode_words, read_spirv_file};
pub use translate::{STUB_SOURCE, Translation, translate_to_msl};
