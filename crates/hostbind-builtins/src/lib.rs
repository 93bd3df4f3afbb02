//! Builtin host types for scripts
//!
//! Every type here is annotated for exposure; `build.rs` generates their
//! binding tables and the registry, and [`Builtins::registry`] is the entry
//! point an interpreter uses to reach them by name.
//!
//! # Usage
//!
//! ```rust,ignore
//! use hostbind_builtins::Builtins;
//! use hostbind_sdk::Value;
//!
//! let registry = Builtins::registry();
//! let v = registry.create_instance("Vector3", &[Value::Float(1.0), Value::Float(2.0), Value::Float(3.0)])?;
//! let x = registry.create_binding("Vector3", "x")?;
//! assert_eq!(x.as_property().unwrap().get(Some(&v))?, Value::Float(1.0));
//! ```

pub mod math;
pub mod scene;
pub mod text;

use hostbind_sdk::script_registry;

/// Registry anchor of the builtin types
#[script_registry]
pub struct Builtins;
