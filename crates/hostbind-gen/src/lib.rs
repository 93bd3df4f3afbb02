//! hostbind-gen - build-time generator of script binding tables
//!
//! Reads the Rust sources of a crate, finds the structs annotated with
//! `#[script_type]` and the members annotated inside their
//! `#[script_methods]` impl blocks, and writes one binding table per type plus
//! the aggregate registry for the `#[script_registry]` anchor.
//!
//! The pipeline:
//!
//! ```text
//! SourceSet ─▶ discovery ─▶ DeclarationSet ─┬▶ synth (per type, parallel) ─┐
//!                                           └──────────────────────────────┴▶ registry ─▶ write_to
//! ```
//!
//! # Build script
//!
//! ```ignore
//! fn main() {
//!     if let Err(e) = hostbind_gen::build() {
//!         panic!("{e}");
//!     }
//! }
//! ```

#![warn(missing_docs)]

pub mod attrs;
pub mod cache;
pub mod cancel;
pub mod discovery;
pub mod error;
pub mod generator;
pub mod model;
pub mod params;
pub mod registry;
pub mod source;
pub mod synth;

pub use cache::DiscoveryCache;
pub use cancel::CancellationToken;
pub use discovery::{discover, link, scan_file};
pub use error::{GenError, GenResult, Location};
pub use generator::{build, Generation, Generator, WriteSummary, OUTPUT_SUBDIR};
pub use model::DeclarationSet;
pub use registry::{RegistryManifest, REGISTRY_FILE_NAME};
pub use source::{SourceFile, SourceSet};
pub use synth::{artifact_file_name, GENERATED_HEADER};
