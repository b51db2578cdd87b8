//! Identifier classification.

use std::{
    borrow::Cow,
    fmt,
    hash::{Hash, Hasher},
};

use rustc_hash::FxHasher;

const SOURCE_SUFFIXES: &[&str] = &[".metal", ".frag", ".vert"];
const ARCHIVE_SUFFIXES: &[&str] = &[".metallib", ".air"];
const SPIRV_SUFFIXES: &[&str] = &[".spv"];

/// How an identifier passed to the loader is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Path to a precompiled `.metallib` or `.air` archive.
    Archive,
    /// Path to an MSL source file.
    SourceFile,
    /// Path to a SPIR-V binary.
    Spirv,
    /// The identifier is the MSL program text.
    Inline,
}

impl SourceKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            SourceKind::Archive => "archive",
            SourceKind::SourceFile => "source",
            SourceKind::Spirv => "spirv",
            SourceKind::Inline => "inline",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify `identifier` by exact, case-sensitive suffix.
///
/// Anything without a recognised suffix, including the empty string, is inline text.
pub fn classify(identifier: &str) -> SourceKind {
    let has_suffix = |suffixes: &[&str]| suffixes.iter().any(|suffix| identifier.ends_with(suffix));
    if has_suffix(SOURCE_SUFFIXES) {
        SourceKind::SourceFile
    } else if has_suffix(ARCHIVE_SUFFIXES) {
        SourceKind::Archive
    } else if has_suffix(SPIRV_SUFFIXES) {
        SourceKind::Spirv
    } else {
        SourceKind::Inline
    }
}

/// Printable form of a cache key. Inline program text is replaced by a stable hash.
pub fn key_label(key: &str) -> Cow<'_, str> {
    match classify(key) {
        SourceKind::Inline => {
            let mut hasher = FxHasher::default();
            key.hash(&mut hasher);
            Cow::Owned(format!("inline:{:016x}", hasher.finish()))
        }
        _ => Cow::Borrowed(key),
    }
}

#[path = "source.test.rs"]
mod tests;
