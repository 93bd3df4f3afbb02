//! `hostbind watch` - regenerate on source changes.
//!
//! File-system events arrive through an mpsc channel fed by the `notify`
//! watcher. Each burst of events starts one run on a worker thread; a run
//! still in flight when the next burst arrives is cancelled first. Runs share
//! a discovery cache, so only changed files are parsed again.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::Context;
use hostbind_gen::{CancellationToken, DiscoveryCache, GenError};
use notify::{recommended_watcher, EventKind, RecursiveMode, Watcher};
use tracing::{debug, error, info, warn};

struct Run {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Run {
    fn supersede(self) {
        self.token.cancel();
        if self.handle.join().is_err() {
            error!("generation worker panicked");
        }
    }
}

pub fn execute(
    sources: Vec<PathBuf>,
    out: PathBuf,
    manifest: Option<PathBuf>,
    debounce_ms: u64,
) -> anyhow::Result<()> {
    let debounce = Duration::from_millis(debounce_ms);
    let cache = DiscoveryCache::new();
    let out = output_root(&out)?;

    let (tx, rx) = mpsc::channel();
    let mut watcher = recommended_watcher(move |res| {
        let _ = tx.send(res);
    })
    .context("failed to create file watcher")?;
    for source in &sources {
        watcher
            .watch(source, RecursiveMode::Recursive)
            .with_context(|| format!("failed to watch {}", source.display()))?;
    }
    info!(sources = sources.len(), out = %out.display(), "watching for changes");

    let mut current = Some(spawn_run(&sources, &out, manifest.as_deref(), &cache));
    loop {
        let event = rx.recv().context("file watcher stopped")?;
        match event {
            Ok(event) if is_relevant(&event, &out) => {
                debug!(paths = ?event.paths, kind = ?event.kind, "source changed");
            }
            Ok(_) => continue,
            Err(e) => {
                warn!("watch error: {}", e);
                continue;
            }
        }

        // Coalesce the rest of the burst
        while rx.recv_timeout(debounce).is_ok() {}

        if let Some(run) = current.take() {
            run.supersede();
        }
        current = Some(spawn_run(&sources, &out, manifest.as_deref(), &cache));
    }
}

/// Create `out` and resolve it the way the watcher reports paths
fn output_root(out: &Path) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(out).with_context(|| format!("failed to create {}", out.display()))?;
    out.canonicalize()
        .with_context(|| format!("failed to resolve {}", out.display()))
}

fn is_relevant(event: &notify::Event, out: &Path) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) && event
        .paths
        .iter()
        .any(|path| !path.starts_with(out) && path.extension().is_some_and(|ext| ext == "rs"))
}

fn spawn_run(
    sources: &[PathBuf],
    out: &Path,
    manifest: Option<&Path>,
    cache: &DiscoveryCache,
) -> Run {
    let token = CancellationToken::new();
    let worker_token = token.clone();
    let sources = sources.to_vec();
    let out = out.to_path_buf();
    let manifest = manifest.map(Path::to_path_buf);
    let cache = cache.clone();

    let handle = std::thread::spawn(move || {
        let result = super::generator(&sources).and_then(|generator| {
            let generation = generator
                .cache(cache)
                .cancellation(worker_token)
                .run(&out)?;
            if let Some(path) = &manifest {
                super::write_manifest(path, &generation)?;
            }
            Ok(generation)
        });

        match result {
            Ok(generation) => info!(types = generation.tables.len(), "bindings up to date"),
            Err(e) if e.downcast_ref::<GenError>().is_some_and(GenError::is_cancelled) => {
                debug!("run superseded");
            }
            Err(e) => error!("{:#}", e),
        }
    });

    Run { token, handle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind};
    use notify::Event;

    fn event(kind: EventKind, path: PathBuf) -> Event {
        Event::new(kind).add_path(path)
    }

    #[test]
    fn test_own_output_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        let root = dir.path().canonicalize().unwrap();

        // Spelled differently from the paths the watcher reports
        let out = output_root(&dir.path().join("src").join("..").join("out")).unwrap();
        assert_eq!(out, root.join("out"));

        let written = event(EventKind::Create(CreateKind::File), root.join("out/Vector3.rs"));
        assert!(!is_relevant(&written, &out));

        let edited = event(EventKind::Modify(ModifyKind::Any), root.join("src/math.rs"));
        assert!(is_relevant(&edited, &out));

        let notes = event(EventKind::Modify(ModifyKind::Any), root.join("src/notes.txt"));
        assert!(!is_relevant(&notes, &out));
    }
}
