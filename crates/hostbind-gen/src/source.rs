//! Source collection
//!
//! A [`SourceSet`] is the declaration set of one run: every `.rs` file under a
//! crate's source root, with the module path it compiles to.

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{GenError, GenResult};

/// One source file of the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path used in diagnostics
    pub path: PathBuf,
    /// Rust module path, starting with `crate`
    pub module_path: Vec<String>,
    /// File contents
    pub text: String,
}

impl SourceFile {
    /// Create a source file from text already in memory
    pub fn new(path: impl Into<PathBuf>, module_path: Vec<String>, text: impl Into<String>) -> Self {
        SourceFile {
            path: path.into(),
            module_path,
            text: text.into(),
        }
    }

    /// Create a crate-root file (`crate` module)
    pub fn root(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self::new(path, vec!["crate".to_string()], text)
    }
}

/// Files of one run, sorted by path
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    files: Vec<SourceFile>,
}

impl SourceSet {
    /// Create a set from files; order is normalized by path
    pub fn new(mut files: Vec<SourceFile>) -> Self {
        files.sort_by(|a, b| a.path.cmp(&b.path));
        SourceSet { files }
    }

    /// Collect every `.rs` file under `root`, skipping binary targets in `bin/`.
    ///
    /// In a package with both `lib.rs` and `main.rs`, only the library crate
    /// is scanned; the binary root is a separate crate.
    pub fn from_dir(root: &Path) -> GenResult<Self> {
        let pattern = root.join("**").join("*.rs");
        let pattern = pattern.to_string_lossy();
        let entries = glob::glob(&pattern).map_err(|e| GenError::Io {
            path: root.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()),
        })?;

        let has_lib = root.join("lib.rs").is_file();
        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| GenError::Io {
                path: e.path().to_path_buf(),
                source: std::io::Error::new(e.error().kind(), e.to_string()),
            })?;
            let Ok(relative) = path.strip_prefix(root) else {
                continue;
            };
            if has_lib && relative == Path::new("main.rs") {
                debug!(path = %path.display(), "skipping binary root next to lib.rs");
                continue;
            }
            let Some(module_path) = module_path_for(relative) else {
                debug!(path = %path.display(), "skipping non-module source");
                continue;
            };
            let text = std::fs::read_to_string(&path).map_err(|source| GenError::Io {
                path: path.clone(),
                source,
            })?;
            files.push(SourceFile {
                path,
                module_path,
                text,
            });
        }

        debug!(root = %root.display(), files = files.len(), "collected sources");
        Ok(SourceSet::new(files))
    }

    /// Merge another set into this one
    pub fn extend(&mut self, other: SourceSet) {
        self.files.extend(other.files);
        self.files.sort_by(|a, b| a.path.cmp(&b.path));
    }

    /// Files in path order
    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// Get number of files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if the set is empty
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Module path of a file, given its path relative to the source root.
///
/// `lib.rs`/`main.rs` are the crate root, `a/mod.rs` is `crate::a`,
/// `a/b.rs` is `crate::a::b`. Files under `bin/` and names that are not
/// identifiers belong to no module of this crate.
pub fn module_path_for(relative: &Path) -> Option<Vec<String>> {
    let mut segments: Vec<String> = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => segments.push(part.to_str()?.to_string()),
            _ => return None,
        }
    }

    let file = segments.pop()?;
    let stem = file.strip_suffix(".rs")?;
    if segments.first().is_some_and(|first| first == "bin") {
        return None;
    }

    let mut module_path = vec!["crate".to_string()];
    module_path.extend(segments);
    match stem {
        "lib" | "main" if module_path.len() == 1 => {}
        "mod" if module_path.len() > 1 => {}
        "lib" | "main" | "mod" => return None,
        other => module_path.push(other.to_string()),
    }

    if module_path[1..]
        .iter()
        .all(|segment| crate::attrs::is_identifier(segment))
    {
        Some(module_path)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(path: &str) -> Option<String> {
        module_path_for(Path::new(path)).map(|segments| segments.join("::"))
    }

    #[test]
    fn test_module_paths() {
        assert_eq!(module("lib.rs").as_deref(), Some("crate"));
        assert_eq!(module("main.rs").as_deref(), Some("crate"));
        assert_eq!(module("math.rs").as_deref(), Some("crate::math"));
        assert_eq!(module("math/mod.rs").as_deref(), Some("crate::math"));
        assert_eq!(module("math/vector.rs").as_deref(), Some("crate::math::vector"));
    }

    #[test]
    fn test_non_module_files() {
        assert_eq!(module("bin/tool.rs"), None);
        assert_eq!(module("mod.rs"), None);
        assert_eq!(module("my-file.rs"), None);
        assert_eq!(module("notes.txt"), None);
    }

    #[test]
    fn test_from_dir_sorts_and_maps() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path();
        std::fs::create_dir_all(src.join("scene")).unwrap();
        std::fs::create_dir_all(src.join("bin")).unwrap();
        std::fs::write(src.join("lib.rs"), "pub mod scene;").unwrap();
        std::fs::write(src.join("scene/mod.rs"), "pub mod node;").unwrap();
        std::fs::write(src.join("scene/node.rs"), "pub struct Node;").unwrap();
        std::fs::write(src.join("bin/tool.rs"), "fn main() {}").unwrap();

        let set = SourceSet::from_dir(src).unwrap();
        let modules: Vec<String> = set
            .files()
            .iter()
            .map(|f| f.module_path.join("::"))
            .collect();
        assert_eq!(modules, ["crate", "crate::scene", "crate::scene::node"]);
    }

    #[test]
    fn test_from_dir_skips_main_next_to_lib() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path();
        std::fs::write(src.join("lib.rs"), "pub struct Shared;").unwrap();
        std::fs::write(src.join("main.rs"), "pub struct Shared;").unwrap();

        let set = SourceSet::from_dir(src).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.files()[0].path, src.join("lib.rs"));

        std::fs::remove_file(src.join("lib.rs")).unwrap();
        let set = SourceSet::from_dir(src).unwrap();
        assert_eq!(set.files()[0].path, src.join("main.rs"));
    }
}
