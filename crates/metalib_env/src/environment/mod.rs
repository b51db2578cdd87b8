//! Process environment abstractions shared across metalib components.

pub mod instrument;
pub mod loader;
pub mod value;

use std::sync::{Mutex, MutexGuard, OnceLock};

use instrument::InstrumentEnvVar;
use loader::LoaderEnvVar;

/// Namespaced environment variable identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnvVar {
    /// Logging and metrics configuration.
    Instrument(InstrumentEnvVar),
    /// Library loading, toolchain and artifact configuration.
    Loader(LoaderEnvVar),
}

impl From<InstrumentEnvVar> for EnvVar {
    fn from(value: InstrumentEnvVar) -> Self {
        Self::Instrument(value)
    }
}

impl From<LoaderEnvVar> for EnvVar {
    fn from(value: LoaderEnvVar) -> Self {
        Self::Loader(value)
    }
}

impl EnvVar {
    /// Retrieve the canonical environment variable key for the identifier.
    pub const fn key(self) -> &'static str {
        match self {
            EnvVar::Instrument(inner) => inner.key(),
            EnvVar::Loader(inner) => inner.key(),
        }
    }
}

/// Process environment facade that serialises every mutation behind one mutex.
pub struct Environment;

impl Environment {
    fn lock() -> MutexGuard<'static, ()> {
        static ENV_MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_MUTEX
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Read the environment variable as a UTF-8 string if present.
    pub fn get(var: impl Into<EnvVar>) -> Option<String> {
        std::env::var(var.into().key()).ok()
    }

    pub fn set(var: impl Into<EnvVar>, value: &str) {
        Self::replace(var.into(), Some(value));
    }

    pub fn remove(var: impl Into<EnvVar>) {
        Self::replace(var.into(), None);
    }

    /// Set (`Some`) or remove (`None`) `var` until the returned scope drops,
    /// then put back whatever the process had before.
    pub fn scoped(var: impl Into<EnvVar>, value: Option<&str>) -> ScopedEnv {
        let var = var.into();
        let previous = Self::replace(var, value);
        ScopedEnv { var, previous }
    }

    /// Swap the value of `var` and return the one it replaced.
    fn replace(var: EnvVar, value: Option<&str>) -> Option<String> {
        let _lock = Self::lock();
        let previous = std::env::var(var.key()).ok();
        // SAFETY: every process-environment write in this crate holds ENV_MUTEX.
        unsafe {
            match value {
                Some(value) => std::env::set_var(var.key(), value),
                None => std::env::remove_var(var.key()),
            }
        }
        previous
    }
}

/// A temporary override of one variable, undone on drop.
#[must_use = "the override is undone as soon as the scope is dropped"]
pub struct ScopedEnv {
    var: EnvVar,
    previous: Option<String>,
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        Environment::replace(self.var, self.previous.as_deref());
    }
}
