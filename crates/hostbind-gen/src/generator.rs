//! Generation driver
//!
//! [`Generator`] runs discovery, per-type synthesis and aggregation over one
//! declaration set and returns the artifacts in memory; [`Generation::write_to`]
//! puts them on disk. Nothing is written until every artifact succeeded.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::cache::DiscoveryCache;
use crate::cancel::CancellationToken;
use crate::discovery::discover;
use crate::error::{GenError, GenResult};
use crate::model::DeclarationSet;
use crate::registry::{aggregate, RegistryArtifact, RegistryManifest};
use crate::source::{SourceFile, SourceSet};
use crate::synth::{synthesize, TypeArtifact, GENERATED_HEADER};

/// Directory under `OUT_DIR` that generated files live in
pub const OUTPUT_SUBDIR: &str = "hostbind";

/// Configured generation run.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    roots: Vec<PathBuf>,
    files: Vec<SourceFile>,
    cache: Option<DiscoveryCache>,
    cancel: CancellationToken,
}

impl Generator {
    /// Create a generator with no sources
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a crate source root; every `.rs` file below it is scanned
    pub fn source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.roots.push(root.into());
        self
    }

    /// Add a single in-memory source file
    pub fn source(mut self, file: SourceFile) -> Self {
        self.files.push(file);
        self
    }

    /// Memoize file scans in `cache` across runs
    pub fn cache(mut self, cache: DiscoveryCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Abort when `token` is cancelled
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Collect the declaration set of the run
    pub fn collect_sources(&self) -> GenResult<SourceSet> {
        let mut sources = SourceSet::new(self.files.clone());
        for root in &self.roots {
            self.cancel.check()?;
            sources.extend(SourceSet::from_dir(root)?);
        }
        Ok(sources)
    }

    /// Run discovery, synthesis and aggregation.
    pub fn generate(&self) -> GenResult<Generation> {
        let started = Instant::now();
        let sources = self.collect_sources()?;
        if let Some(cache) = &self.cache {
            // Deleted files must not linger in later runs
            let paths: Vec<PathBuf> = sources.files().iter().map(|f| f.path.clone()).collect();
            cache.retain_paths(&paths);
        }
        let declarations = discover(&sources, self.cache.as_ref(), &self.cancel)?;

        let tables = declarations
            .types
            .par_iter()
            .map(|ty| {
                self.cancel.check()?;
                synthesize(ty)
            })
            .collect::<GenResult<Vec<_>>>()?;

        self.cancel.check()?;
        let registry = aggregate(&declarations)?;
        let manifest = RegistryManifest::from_declarations(&declarations);

        info!(
            files = sources.len(),
            types = tables.len(),
            registry = registry.is_some(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "generated bindings"
        );
        Ok(Generation {
            declarations,
            tables,
            registry,
            manifest,
        })
    }

    /// Generate and write to `out_dir`, unless cancelled first
    pub fn run(&self, out_dir: &Path) -> GenResult<Generation> {
        let generation = self.generate()?;
        self.cancel.check()?;
        generation.write_to(out_dir)?;
        Ok(generation)
    }
}

/// Artifacts of one run
#[derive(Debug, Clone)]
pub struct Generation {
    /// Linked declarations
    pub declarations: DeclarationSet,
    /// One binding table per exposed type, in declaration order
    pub tables: Vec<TypeArtifact>,
    /// The registry, when an anchor is declared
    pub registry: Option<RegistryArtifact>,
    /// Tooling description of the registry
    pub manifest: RegistryManifest,
}

/// What [`Generation::write_to`] did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Files created or replaced
    pub written: Vec<PathBuf>,
    /// Files already up to date
    pub unchanged: Vec<PathBuf>,
    /// Stale artifacts deleted
    pub removed: Vec<PathBuf>,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> GenError + '_ {
    move |source| GenError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Whether `path` starts with the header every artifact carries
fn is_generated(path: &Path) -> bool {
    std::fs::read_to_string(path).is_ok_and(|code| code.starts_with(GENERATED_HEADER))
}

impl Generation {
    /// `(file name, code)` of every artifact
    pub fn files(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tables
            .iter()
            .map(|t| (t.file_name.as_str(), t.code.as_str()))
            .chain(
                self.registry
                    .iter()
                    .map(|r| (r.file_name.as_str(), r.code.as_str())),
            )
    }

    /// Write every artifact into `out_dir`.
    ///
    /// Files are replaced through a temp file and rename; identical files are
    /// left untouched; generated `.rs` files from earlier runs that this run
    /// no longer produces are removed. Files without the generated header are
    /// never touched.
    pub fn write_to(&self, out_dir: &Path) -> GenResult<WriteSummary> {
        std::fs::create_dir_all(out_dir).map_err(io_error(out_dir))?;
        let mut summary = WriteSummary::default();
        let mut produced = BTreeSet::new();

        for (name, code) in self.files() {
            produced.insert(name.to_string());
            let target = out_dir.join(name);
            if std::fs::read_to_string(&target).is_ok_and(|existing| existing == code) {
                summary.unchanged.push(target);
                continue;
            }

            let temp = out_dir.join(format!(".{}.tmp", name));
            std::fs::write(&temp, code).map_err(io_error(&temp))?;
            std::fs::rename(&temp, &target).map_err(io_error(&target))?;
            debug!(path = %target.display(), "wrote artifact");
            summary.written.push(target);
        }

        for entry in std::fs::read_dir(out_dir).map_err(io_error(out_dir))? {
            let path = entry.map_err(io_error(out_dir))?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if name.ends_with(".rs") && !produced.contains(name) && is_generated(&path) {
                std::fs::remove_file(&path).map_err(io_error(&path))?;
                debug!(path = %path.display(), "removed stale artifact");
                summary.removed.push(path);
            }
        }
        summary.removed.sort();

        info!(
            out_dir = %out_dir.display(),
            written = summary.written.len(),
            unchanged = summary.unchanged.len(),
            removed = summary.removed.len(),
            "wrote bindings"
        );
        Ok(summary)
    }
}

// ============================================================================
// Build-script entry point
// ============================================================================

fn env_path(name: &'static str) -> GenResult<PathBuf> {
    std::env::var_os(name)
        .map(PathBuf::from)
        .ok_or(GenError::MissingEnv { name })
}

/// Generate bindings for the crate being built.
///
/// Call from `build.rs`. Scans `$CARGO_MANIFEST_DIR/src`, writes into
/// `$OUT_DIR/hostbind`, and asks cargo to rerun when sources change.
pub fn build() -> GenResult<Generation> {
    let src = env_path("CARGO_MANIFEST_DIR")?.join("src");
    let out_dir = env_path("OUT_DIR")?.join(OUTPUT_SUBDIR);

    println!("cargo:rerun-if-changed={}", src.display());
    Generator::new().source_root(&src).run(&out_dir)
}
