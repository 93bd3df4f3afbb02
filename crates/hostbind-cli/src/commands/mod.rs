//! CLI subcommands.

pub mod check;
pub mod generate;
pub mod watch;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use hostbind_gen::{Generation, Generator, SourceFile};

/// Generator over `sources`: directories are source roots, files are crate roots
pub(crate) fn generator(sources: &[PathBuf]) -> anyhow::Result<Generator> {
    let mut generator = Generator::new();
    for source in sources {
        if source.is_dir() {
            generator = generator.source_root(source);
        } else if source.is_file() {
            let text = std::fs::read_to_string(source)
                .with_context(|| format!("failed to read {}", source.display()))?;
            generator = generator.source(SourceFile::root(source, text));
        } else {
            bail!("source `{}` does not exist", source.display());
        }
    }
    Ok(generator)
}

/// Write the registry manifest of `generation` to `path`
pub(crate) fn write_manifest(path: &Path, generation: &Generation) -> anyhow::Result<()> {
    let json = generation
        .manifest
        .to_json()
        .context("failed to serialize manifest")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, json + "\n")
        .with_context(|| format!("failed to write manifest {}", path.display()))
}
