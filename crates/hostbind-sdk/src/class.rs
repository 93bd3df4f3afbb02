//! ScriptClass — the per-type binding table
//!
//! `hostbind-gen` emits one `impl ScriptClass` for every exposed host type,
//! next to the type's declaration. It is the only surface the interpreter
//! touches per type.

use std::any::Any;

use crate::binding::MemberBinding;
use crate::error::BindResult;
use crate::value::{Instance, Value};

/// Construct an instance from an untyped argument sequence
pub type Factory = fn(&[Value]) -> BindResult<Instance>;

/// Resolve a member binding by exposed name
pub type BindingResolver = fn(&str) -> BindResult<MemberBinding>;

/// Binding table of one exposed host type.
pub trait ScriptClass: Any + Send + Sync + Sized {
    /// Exposed type name
    const CLASS_NAME: &'static str;

    /// The type is never instantiated; only type-level members are used
    const IS_STATIC: bool = false;

    /// The interpreter must refuse to instantiate the type
    const IS_ABSTRACT: bool = false;

    /// Members of the exposed base type are visible through this type
    const INHERIT_BASE_MEMBERS: bool = true;

    /// Exposed field, property and method names, in declaration order
    const MEMBER_NAMES: &'static [&'static str];

    /// Pick a constructor overload for `args` and call it
    fn create_instance(args: &[Value]) -> BindResult<Self>;

    /// Resolve an exposed member name to its binding
    fn create_member_binding(name: &str) -> BindResult<MemberBinding>;

    /// Check whether `name` is an exposed member of this type
    fn has_member(name: &str) -> bool {
        Self::MEMBER_NAMES.contains(&name)
    }
}

/// Construct `T` from `args` and wrap it in an [`Instance`].
///
/// Coerces to [`Factory`], which is how registries store constructors.
pub fn create_erased<T: ScriptClass>(args: &[Value]) -> BindResult<Instance> {
    T::create_instance(args).map(|value| Instance::new(T::CLASS_NAME, value))
}
