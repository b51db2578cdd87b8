//! The library loader: classify, compile or load, cache, resolve.

use std::{fmt, path::Path, time::Instant};

use metalib_instrumentation::{IMPORT_SPAN, MetricEvent, record_metric};
use tracing::{debug, info, info_span};

use crate::{
    backend::{Backend, BuildMode, toolchain::{Toolchain, XcrunToolchain}},
    cache::{CacheMetrics, LibraryCache},
    config::LoaderConfig,
    device::{Device, Function, Library},
    error::LoaderError,
    source::{SourceKind, classify, key_label},
    spirv::{read_spirv_file, translate_to_msl},
};

/// Loads Metal libraries and keeps each one for the lifetime of the loader.
///
/// Every import checks the cache first, so a given identifier is compiled at
/// most once. Failures are logged where they happen and never cached. The
/// loader has no internal locking; share it across threads only behind a mutex.
pub struct LibraryLoader<D: Device, T: Toolchain = XcrunToolchain> {
    device: D,
    toolchain: T,
    config: LoaderConfig,
    cache: LibraryCache<D::Library>,
}

impl<D: Device> LibraryLoader<D, XcrunToolchain> {
    pub fn new(device: D, config: LoaderConfig) -> Self {
        let toolchain = XcrunToolchain::new(config.toolchain.clone());
        Self::with_toolchain(device, toolchain, config)
    }
}

impl<D: Device, T: Toolchain> LibraryLoader<D, T> {
    pub fn with_toolchain(device: D, toolchain: T, config: LoaderConfig) -> Self {
        Self {
            device,
            toolchain,
            config,
            cache: LibraryCache::new(),
        }
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn toolchain(&self) -> &T {
        &self.toolchain
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn cache(&self) -> &LibraryCache<D::Library> {
        &self.cache
    }

    pub fn metrics(&self) -> CacheMetrics {
        self.cache.metrics()
    }

    /// Import a precompiled `.metallib`/`.air` archive.
    pub fn import_metallib(&mut self, path: &str) -> Result<&D::Library, LoaderError> {
        self.import_with(path, SourceKind::Archive, "load", |backend| backend.load_archive(Path::new(path)))
    }

    /// Compile `program` as MSL. The program text is its own cache key.
    pub fn import_source_string(&mut self, program: &str, mode: BuildMode) -> Result<&D::Library, LoaderError> {
        self.import_with(program, SourceKind::Inline, mode.as_str(), |backend| backend.compile_source(program, mode))
    }

    /// Compile the MSL source file at `path`.
    pub fn import_source_file(&mut self, path: &str, mode: BuildMode) -> Result<&D::Library, LoaderError> {
        self.import_with(path, SourceKind::SourceFile, mode.as_str(), |backend| {
            backend.compile_file(Path::new(path), mode)
        })
    }

    /// Translate the SPIR-V file at `path` to MSL and compile the result.
    ///
    /// A module that fails to translate is compiled as an empty program, so the
    /// import succeeds with a library that has no functions.
    pub fn import_spirv(&mut self, path: &str, mode: BuildMode) -> Result<&D::Library, LoaderError> {
        let version = self.config.compile_options.language_version;
        self.import_with(path, SourceKind::Spirv, mode.as_str(), |backend| {
            let words = read_spirv_file(Path::new(path))?;
            let source = translate_to_msl(&words, version).into_source();
            backend.compile_source(&source, mode)
        })
    }

    /// Classify `identifier` and dispatch to the matching import.
    pub fn import(&mut self, identifier: &str, mode: BuildMode) -> Result<&D::Library, LoaderError> {
        match classify(identifier) {
            SourceKind::Archive => self.import_metallib(identifier),
            SourceKind::SourceFile => self.import_source_file(identifier, mode),
            SourceKind::Spirv => self.import_spirv(identifier, mode),
            SourceKind::Inline => self.import_source_string(identifier, mode),
        }
    }

    /// Import `key` with the configured build mode and create the function `name` from it.
    pub fn get_kernel_function(&mut self, key: &str, name: &str) -> Result<D::Function, LoaderError> {
        let mode = self.config.build_mode;
        let library = self.import(key, mode)?;
        library.new_function(name).ok_or_else(|| {
            debug!(key = %key_label(key), function = name, "function not found in library");
            LoaderError::FunctionNotFound {
                library: key_label(key).into_owned(),
                function: name.to_owned(),
            }
        })
    }

    /// Search every cached library for a function called `name`.
    ///
    /// Libraries are visited in ascending key order and functions in the order
    /// each library reports them; the first match wins. Nothing is imported.
    pub fn find_kernel_function(&self, name: &str) -> Option<D::Function> {
        self.cache.iter().find_map(|(key, library)| {
            if !library.function_names().iter().any(|candidate| candidate == name) {
                return None;
            }
            let function = library.new_function(name)?;
            debug!(key = %key_label(key), function = name, "resolved function by search");
            Some(function)
        })
    }

    fn import_with(
        &mut self,
        key: &str,
        kind: SourceKind,
        mode: &'static str,
        build: impl FnOnce(&Backend<'_, D, T>) -> Result<D::Library, LoaderError>,
    ) -> Result<&D::Library, LoaderError> {
        let label = key_label(key);
        let span = info_span!(IMPORT_SPAN, key = %label, %kind, mode);
        let _enter = span.enter();

        let hit = self.cache.contains(key);
        record_metric!(MetricEvent::LibraryCacheAccess {
            key: label.to_string(),
            hit,
        });
        if hit {
            debug!("library cache hit");
        }

        let backend = Backend::new(&self.device, &self.toolchain, &self.config);
        self.cache.get_or_try_insert_with(key, || {
            let started = Instant::now();
            let library = build(&backend)?;
            let duration_us = started.elapsed().as_micros() as u64;
            info!(duration_us, functions = library.function_names().len(), "library imported");
            record_metric!(MetricEvent::LibraryImported {
                key: label.to_string(),
                kind: kind.as_str().to_owned(),
                mode: mode.to_owned(),
                duration_us,
            });
            Ok(library)
        })
    }
}

/// Lists every cached library with its functions and their stage-input attributes.
impl<D: Device, T: Toolchain> fmt::Display for LibraryLoader<D, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, library) in self.cache.iter() {
            writeln!(f, "* {}: ", key_label(key))?;
            for name in library.function_names() {
                let Some(function) = library.new_function(&name) else {
                    continue;
                };
                write!(f, "   * {name}:   ")?;
                for attribute in function.stage_input_attributes() {
                    write!(f, "{attribute}, ")?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

#[path = "loader.test.rs"]
mod tests;
