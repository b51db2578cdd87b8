use std::{
    io,
    path::{Path, PathBuf},
};

use metalib_instrumentation::{MetricEvent, record_metric};
use tracing::{debug, warn};

/// Randomly named `.metallib` path that is deleted when the guard drops.
///
/// The file itself is created by the toolchain; the guard only reserves the
/// name and guarantees cleanup on every exit path.
pub struct TempArtifact {
    path: PathBuf,
}

impl TempArtifact {
    pub fn new(dir: &Path) -> Self {
        let suffix: u64 = rand::random();
        Self {
            path: dir.join(format!("mtl-{suffix}.metallib")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        let existed = match std::fs::remove_file(&self.path) {
            Ok(()) => true,
            Err(err) if err.kind() == io::ErrorKind::NotFound => false,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "failed to remove compiled artifact");
                true
            }
        };
        debug!(path = %self.path.display(), existed, "removed compiled artifact");
        record_metric!(MetricEvent::ArtifactRemoved {
            path: self.path.display().to_string(),
            existed,
        });
    }
}

#[path = "artifact.test.rs"]
mod tests;
