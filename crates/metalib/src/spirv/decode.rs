use std::path::Path;

use tracing::error;

use crate::error::LoaderError;

/// First word of every SPIR-V module, in the module's own byte order.
pub const SPIRV_MAGIC: u32 = 0x0723_0203;

const WORD_BYTES: usize = 4;

/// Split a SPIR-V byte stream into 32-bit words.
///
/// Words are read little-endian and the header is not inspected. An empty
/// stream yields no words; a length that is not a multiple of four is rejected
/// rather than padded.
pub fn decode_words(bytes: &[u8]) -> Result<Vec<u32>, LoaderError> {
    if bytes.len() % WORD_BYTES != 0 {
        return Err(LoaderError::MisalignedSpirv { len: bytes.len() });
    }

    let words = bytes
        .chunks_exact(WORD_BYTES)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    Ok(words)
}

/// Read and decode a SPIR-V file.
pub fn read_spirv_file(path: &Path) -> Result<Vec<u32>, LoaderError> {
    let bytes = std::fs::read(path).map_err(|source| {
        error!(path = %path.display(), %source, "cannot open SPIR-V file");
        LoaderError::FileNotFound {
            path: path.to_path_buf(),
            source,
        }
    })?;
    decode_words(&bytes).inspect_err(|err| error!(path = %path.display(), %err, "cannot decode SPIR-V file"))
}

#[path = "decode.test.rs"]
mod tests;
