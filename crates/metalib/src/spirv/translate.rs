use metalib_instrumentation::{MetricEvent, record_metric};
use naga::{
    back::msl,
    front::spv,
    valid::{Capabilities, ValidationFlags, Validator},
};
use tracing::{debug, warn};

use std::borrow::Cow;

use super::SPIRV_MAGIC;
use crate::device::LanguageVersion;

/// Program substituted when translation fails. It compiles to a library with no functions.
pub const STUB_SOURCE: &str = "#include <metal_stdlib>\n";

/// Outcome of translating SPIR-V to MSL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translation {
    Source(String),
    /// Translation failed; compilation continues with [`STUB_SOURCE`].
    Stub { reason: String },
}

impl Translation {
    pub fn is_stub(&self) -> bool {
        matches!(self, Translation::Stub { .. })
    }

    /// MSL to hand to the compiler.
    pub fn into_source(self) -> String {
        match self {
            Translation::Source(source) => source,
            Translation::Stub { .. } => STUB_SOURCE.to_owned(),
        }
    }
}

/// Translate decoded SPIR-V words into MSL targeting `version`.
///
/// Failures never escape: they are logged, recorded as a metric, and turned
/// into [`Translation::Stub`] so the error surfaces later as a missing function.
pub fn translate_to_msl(words: &[u32], version: LanguageVersion) -> Translation {
    match try_translate(words, version) {
        Ok(source) => {
            debug!(words = words.len(), bytes = source.len(), %version, "translated SPIR-V to MSL");
            Translation::Source(source)
        }
        Err(reason) => {
            warn!(words = words.len(), %reason, "SPIR-V translation failed, substituting empty program");
            record_metric!(MetricEvent::TranslationFallback { reason: reason.clone() });
            Translation::Stub { reason }
        }
    }
}

/// Module words in host order. A module written big-endian decodes with a
/// byte-swapped magic, so every word is swapped back.
fn host_order(words: &[u32]) -> Cow<'_, [u32]> {
    match words.first() {
        Some(&first) if first == SPIRV_MAGIC.swap_bytes() => {
            debug!(words = words.len(), "SPIR-V module is byte-swapped");
            Cow::Owned(words.iter().map(|word| word.swap_bytes()).collect())
        }
        _ => Cow::Borrowed(words),
    }
}

fn try_translate(words: &[u32], version: LanguageVersion) -> Result<String, String> {
    let words = host_order(words);
    let module = spv::Frontend::new(words.iter().copied(), &spv::Options::default())
        .parse()
        .map_err(|err| format!("parse: {err}"))?;
    let info = Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|err| format!("validate: {}", err.as_inner()))?;
    let options = msl::Options {
        lang_version: (version.major, version.minor),
        ..msl::Options::default()
    };
    let (source, _) =
        msl::write_string(&module, &info, &options, &msl::PipelineOptions::default()).map_err(|err| format!("emit: {err}"))?;
    Ok(source)
}

#[path = "translate.test.rs"]
mod tests;
