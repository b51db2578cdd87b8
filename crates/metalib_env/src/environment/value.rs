//! Typed environment variable descriptors.
//!
//! [`TypedEnvVar`] pairs an [`EnvVar`] with parse and format callbacks so
//! configuration code reads typed values instead of raw strings. Scoped
//! setters hand back guards that put the previous process state back on drop.
//!
//! ```
//! use metalib_env::TOOLCHAIN_SDK;
//!
//! let guard = TOOLCHAIN_SDK.set_guard("iphoneos".to_string()).expect("set sdk");
//! assert_eq!(guard.as_str(), "iphoneos");
//! ```

use std::{marker::PhantomData, ops::Deref, path::PathBuf};

use super::{EnvVar, Environment, ScopedEnv};

/// Errors emitted when interacting with typed environment variables.
#[derive(Debug, thiserror::Error)]
pub enum EnvVarError {
    #[error("failed to parse environment variable {name} from '{value}': {source}")]
    Parse {
        name: &'static str,
        value: String,
        source: EnvVarParseError,
    },
    #[error("failed to format environment variable {name}: {source}")]
    Format { name: &'static str, source: EnvVarFormatError },
}

/// Error produced by a [`TypedEnvVar`] parsing callback.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct EnvVarParseError {
    message: String,
}

impl EnvVarParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Error produced by a [`TypedEnvVar`] formatting callback.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct EnvVarFormatError {
    message: String,
}

impl EnvVarFormatError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Callback used to parse an environment string into a concrete value.
pub type ParseFn<T> = fn(&str) -> Result<T, EnvVarParseError>;
/// Callback used to format a typed value before storing it in the environment.
pub type FormatFn<T> = fn(&T) -> Result<String, EnvVarFormatError>;

/// Descriptor for a strongly-typed environment variable.
#[derive(Clone, Copy)]
pub struct TypedEnvVar<T> {
    var: EnvVar,
    parse: ParseFn<T>,
    format: FormatFn<T>,
    _marker: PhantomData<T>,
}

impl<T> TypedEnvVar<T> {
    pub const fn new(var: EnvVar, parse: ParseFn<T>, format: FormatFn<T>) -> Self {
        Self {
            var,
            parse,
            format,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn key(&self) -> &'static str {
        self.var.key()
    }

    #[must_use]
    pub const fn var(&self) -> EnvVar {
        self.var
    }

    fn format_value(&self, value: &T) -> Result<String, EnvVarError> {
        (self.format)(value).map_err(|source| EnvVarError::Format { name: self.key(), source })
    }

    /// Read the environment variable and parse it into the typed value.
    pub fn get(&self) -> Result<Option<T>, EnvVarError> {
        match Environment::get(self.var) {
            Some(raw) => (self.parse)(&raw).map(Some).map_err(|source| EnvVarError::Parse {
                name: self.key(),
                value: raw,
                source,
            }),
            None => Ok(None),
        }
    }

    /// Read the variable, falling back to `default` when it is unset.
    ///
    /// A present but malformed value is still an error; callers decide whether
    /// to surface it or log and continue.
    pub fn get_or(&self, default: T) -> Result<T, EnvVarError> {
        Ok(self.get()?.unwrap_or(default))
    }

    pub fn set(&self, value: T) -> Result<(), EnvVarError> {
        let formatted = self.format_value(&value)?;
        Environment::set(self.var, &formatted);
        Ok(())
    }

    pub fn unset(&self) {
        Environment::remove(self.var);
    }

    /// Set the environment variable for the lifetime of the returned guard.
    pub fn set_guard(&self, value: T) -> Result<TypedEnvVarGuard<T>, EnvVarError> {
        let formatted = self.format_value(&value)?;
        Ok(TypedEnvVarGuard {
            _scope: Environment::scoped(self.var, Some(&formatted)),
            value,
        })
    }

    /// Unset the environment variable for the lifetime of the scope.
    pub fn unset_guard(&self) -> ScopedEnv {
        Environment::scoped(self.var, None)
    }
}

/// Typed override that keeps the value it wrote readable through `Deref`.
pub struct TypedEnvVarGuard<T> {
    _scope: ScopedEnv,
    value: T,
}

impl<T> Deref for TypedEnvVarGuard<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

pub(crate) fn parse_bool(value: &str) -> Result<bool, EnvVarParseError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(EnvVarParseError::new("value is not a recognised boolean")),
    }
}

pub(crate) fn format_bool(value: &bool) -> Result<String, EnvVarFormatError> {
    Ok(value.to_string())
}

pub(crate) fn parse_path(value: &str) -> Result<PathBuf, EnvVarParseError> {
    if value.is_empty() {
        return Err(EnvVarParseError::new("path must not be empty"));
    }
    Ok(PathBuf::from(value))
}

pub(crate) fn format_path(path: &PathBuf) -> Result<String, EnvVarFormatError> {
    path.to_str()
        .map(str::to_owned)
        .ok_or_else(|| EnvVarFormatError::new("path is not valid UTF-8"))
}

pub(crate) fn parse_word(value: &str) -> Result<String, EnvVarParseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
        return Err(EnvVarParseError::new("expected a single non-empty word"));
    }
    Ok(trimmed.to_owned())
}

pub(crate) fn format_word(value: &String) -> Result<String, EnvVarFormatError> {
    parse_word(value).map_err(|err| EnvVarFormatError::new(err.to_string()))
}
