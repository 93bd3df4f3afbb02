//! Generation-time errors
//!
//! Everything here is a defect in the host declarations (or the file system),
//! reported while generating. Runtime failures live in `hostbind_sdk::BindError`.

use std::fmt;
use std::path::{Path, PathBuf};

use proc_macro2::Span;
use serde::{Deserialize, Serialize};

/// Source position of a declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// File path as given to the generator
    pub path: PathBuf,
    /// 1-based line
    pub line: usize,
    /// 1-based column
    pub column: usize,
}

impl Location {
    /// Location of `span` in `path`
    pub fn new(path: &Path, span: Span) -> Self {
        let start = span.start();
        Location {
            path: path.to_path_buf(),
            line: start.line,
            column: start.column + 1,
        }
    }

    /// Start of `path`
    pub fn file(path: &Path) -> Self {
        Location {
            path: path.to_path_buf(),
            line: 1,
            column: 1,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.path.display(), self.line, self.column)
    }
}

/// Result type for generation
pub type GenResult<T> = Result<T, GenError>;

/// Generation failure
#[derive(Debug, thiserror::Error)]
pub enum GenError {
    /// Reading sources or writing artifacts failed
    #[error("I/O error on `{}`: {source}", path.display())]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// A source file is not valid Rust
    #[error("{location}: parse error: {message}")]
    Parse {
        /// Where the parser stopped
        location: Location,
        /// Parser message
        message: String,
    },

    /// An annotation has unknown or malformed arguments
    #[error("{location}: invalid attribute: {message}")]
    InvalidAttribute {
        /// Attribute position
        location: Location,
        /// What is wrong
        message: String,
    },

    /// An exposed declaration has a shape bindings cannot be generated for
    #[error("{location}: {message}")]
    Unsupported {
        /// Declaration position
        location: Location,
        /// What is unsupported
        message: String,
    },

    /// Two members of one type share an exposed name
    #[error("{location}: duplicate exposed member `{member}` in `{type_name}` (first declared at {first})")]
    DuplicateMember {
        /// Exposed type name
        type_name: String,
        /// Exposed member name
        member: String,
        /// First declaration
        first: Location,
        /// Conflicting declaration
        location: Location,
    },

    /// Two exposed types share an exposed name
    #[error("{location}: duplicate exposed type name `{name}` (first declared at {first})")]
    DuplicateType {
        /// Exposed type name
        name: String,
        /// First declaration
        first: Location,
        /// Conflicting declaration
        location: Location,
    },

    /// More than one `#[script_registry]` in one run
    #[error("{second}: multiple registry anchors (first at {first})")]
    MultipleAnchors {
        /// First anchor
        first: Location,
        /// Conflicting anchor
        second: Location,
    },

    /// More than one constructor takes the whole argument array
    #[error("{location}: `{type_name}` declares more than one argument-array constructor")]
    MultipleVariadicConstructors {
        /// Exposed type name
        type_name: String,
        /// Second variadic constructor
        location: Location,
    },

    /// A `base = ..` path matches several exposed types
    #[error("{location}: base type `{base}` of `{type_name}` is ambiguous; candidates: {}", candidates.join(", "))]
    AmbiguousBase {
        /// Exposed type name
        type_name: String,
        /// Base path as written
        base: String,
        /// Rust paths of the matching types
        candidates: Vec<String>,
        /// Type declaration
        location: Location,
    },

    /// Following `base = ..` links returns to the starting type
    #[error("{location}: base type chain of `{type_name}` is cyclic")]
    BaseCycle {
        /// Exposed type name
        type_name: String,
        /// Type declaration
        location: Location,
    },

    /// A `#[script_methods]` block whose self type is not exposed in its module
    #[error("{location}: `#[script_methods]` impl for `{ident}` has no `#[script_type]` struct in module `{module}`")]
    OrphanMethods {
        /// Self type ident
        ident: String,
        /// Rust module path
        module: String,
        /// Impl block position
        location: Location,
    },

    /// A build-script environment variable is not set
    #[error("environment variable `{name}` is not set; run from a build script or pass paths explicitly")]
    MissingEnv {
        /// Variable name
        name: &'static str,
    },

    /// The run was superseded
    #[error("generation cancelled")]
    Cancelled,
}

impl GenError {
    /// Convert a `syn` error raised while reading `path`
    pub fn from_syn(path: &Path, err: &syn::Error) -> Self {
        GenError::InvalidAttribute {
            location: Location::new(path, err.span()),
            message: err.to_string(),
        }
    }

    /// Create an `Unsupported` error at `span`
    pub fn unsupported(path: &Path, span: Span, message: impl Into<String>) -> Self {
        GenError::Unsupported {
            location: Location::new(path, span),
            message: message.into(),
        }
    }

    /// Check if the error is a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, GenError::Cancelled)
    }
}
