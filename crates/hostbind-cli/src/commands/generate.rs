//! `hostbind generate` - write binding tables and the registry.

use std::path::{Path, PathBuf};

use anyhow::Context;

pub fn execute(sources: &[PathBuf], out: &Path, manifest: Option<&Path>) -> anyhow::Result<()> {
    let generation = super::generator(sources)?
        .generate()
        .context("generation failed")?;
    let summary = generation
        .write_to(out)
        .with_context(|| format!("failed to write bindings to {}", out.display()))?;

    if let Some(path) = manifest {
        super::write_manifest(path, &generation)?;
    }

    println!(
        "Generated {} type(s){} into {}: {} written, {} unchanged, {} removed",
        generation.tables.len(),
        if generation.registry.is_some() { " + registry" } else { "" },
        out.display(),
        summary.written.len(),
        summary.unchanged.len(),
        summary.removed.len(),
    );
    Ok(())
}
