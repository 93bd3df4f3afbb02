//! Build script for the builtin bindings
//!
//! Scans `src/` for exposed types and writes their binding tables and the
//! registry under `$OUT_DIR/hostbind`, where the annotation macros include
//! them from.

fn main() {
    if let Err(e) = hostbind_gen::build() {
        panic!("failed to generate script bindings: {e}");
    }
}
