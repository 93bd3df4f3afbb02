//! hostbind SDK - runtime contract for generated script bindings
//!
//! This crate holds the types that `hostbind-gen` emits code against and that
//! an interpreter calls into: the untyped [`Value`], shared host
//! [`Instance`]s, the [`ScriptClass`] binding table implemented for every
//! exposed type, and the [`TypeRegistry`] built by the registry anchor.
//!
//! # Example
//!
//! ```ignore
//! use hostbind_sdk::{script_methods, script_registry, script_type, Value};
//!
//! #[script_type(name = "Vector3")]
//! pub struct Vec3 {
//!     #[script_property]
//!     pub x: f32,
//! }
//!
//! #[script_methods]
//! impl Vec3 {
//!     #[script_constructor]
//!     pub fn new(x: f32) -> Self {
//!         Vec3 { x }
//!     }
//! }
//!
//! #[script_registry]
//! pub struct Builtins;
//!
//! let v = Builtins::registry().create_instance("Vector3", &[Value::Float(1.0)])?;
//! ```

#![warn(missing_docs)]

pub mod binding;
pub mod class;
pub mod convert;
pub mod error;
pub mod registry;
pub mod value;

pub use binding::{
    with_receiver, with_receiver_mut, Getter, Invoker, MemberBinding, MethodBinding,
    PropertyBinding, Setter,
};
pub use class::{create_erased, BindingResolver, Factory, ScriptClass};
pub use convert::{arg, convert_to, instance_of, FromValue, IntoValue};
pub use error::{BindError, BindResult, ConvertError};
pub use registry::{TypeEntry, TypeRegistry};
pub use value::{Instance, InstanceMut, InstanceRef, Value};

#[cfg(feature = "macros")]
pub use hostbind_macros::{script_methods, script_registry, script_type};

/// Re-exports used by generated code. Not part of the public API.
#[doc(hidden)]
pub mod __private {
    pub use once_cell::sync::Lazy;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // Hand-written binding table with the same shape hostbind-gen emits
    struct Counter {
        count: i64,
    }

    impl Counter {
        fn get_count(instance: Option<&Instance>) -> BindResult<Value> {
            with_receiver::<Counter, _>(instance, |this| this.count.into_value())
        }

        fn set_count(instance: Option<&Instance>, value: &Value) -> BindResult<()> {
            let value: i64 = convert_to::<i64>(value)?;
            with_receiver_mut::<Counter, _>(instance, |this| this.count = value)
        }

        fn call_bump(instance: Option<&Instance>, args: &[Value]) -> BindResult<Option<Value>> {
            let mut by: i64 = 1i64;
            if args.len() > 0usize {
                by = convert_to::<i64>(&args[0usize])?;
            }
            with_receiver_mut::<Counter, _>(instance, move |this| this.count += by)?;
            Ok(None)
        }
    }

    impl ScriptClass for Counter {
        const CLASS_NAME: &'static str = "Counter";
        const MEMBER_NAMES: &'static [&'static str] = &["count", "bump"];

        fn create_instance(args: &[Value]) -> BindResult<Self> {
            if args.len() == 0usize {
                return Ok(Counter { count: 0 });
            }
            if args.len() == 1usize {
                let count: i64 = convert_to::<i64>(arg(args, 0usize, "Counter")?)?;
                return Ok(Counter { count });
            }
            Err(BindError::Arity {
                type_name: Self::CLASS_NAME,
                count: args.len(),
            })
        }

        fn create_member_binding(name: &str) -> BindResult<MemberBinding> {
            match name {
                "count" => Ok(MemberBinding::Property(PropertyBinding::new(
                    "count",
                    Self::CLASS_NAME,
                    Some(Counter::get_count),
                    Some(Counter::set_count),
                ))),
                "bump" => Ok(MemberBinding::Method(MethodBinding::new(
                    "bump",
                    Counter::call_bump,
                ))),
                _ => Err(BindError::binding_not_found(name, Self::CLASS_NAME)),
            }
        }
    }

    struct Clock;

    impl ScriptClass for Clock {
        const CLASS_NAME: &'static str = "Clock";
        const IS_STATIC: bool = true;
        const IS_ABSTRACT: bool = true;
        const MEMBER_NAMES: &'static [&'static str] = &[];

        fn create_instance(args: &[Value]) -> BindResult<Self> {
            Err(BindError::Arity {
                type_name: Self::CLASS_NAME,
                count: args.len(),
            })
        }

        fn create_member_binding(name: &str) -> BindResult<MemberBinding> {
            Err(BindError::binding_not_found(name, Self::CLASS_NAME))
        }
    }

    const ENTRIES: &[TypeEntry] = &[
        TypeEntry::of::<Counter>(None),
        TypeEntry::of::<Clock>(Some("Counter")),
    ];

    #[test]
    fn test_registry_indices() {
        let registry = TypeRegistry::new(ENTRIES);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.type_names().collect::<Vec<_>>(), ["Counter", "Clock"]);
        assert_eq!(registry.base_type_name("Clock"), Some("Counter"));
        assert_eq!(registry.base_type_name("Counter"), None);
        assert!(registry.is_static_type("Clock"));
        assert!(registry.is_abstract_type("Clock"));
        assert!(!registry.is_static_type("Counter"));
        assert!(registry.member_names("Counter").unwrap().contains("bump"));
        assert!(registry.member_names("Clock").unwrap().is_empty());
    }

    #[test]
    fn test_registry_create_and_bind() {
        let registry = TypeRegistry::new(ENTRIES);

        let counter = registry.create_instance("Counter", &[Value::Int(3)]).unwrap();
        assert_eq!(counter.class_name(), "Counter");

        let count = registry.create_binding("Counter", "count").unwrap();
        let count = count.as_property().unwrap();
        assert_eq!(count.get(Some(&counter)).unwrap(), Value::Int(3));

        let bump = registry.create_binding("Counter", "bump").unwrap();
        let result = bump.as_method().unwrap().invoke(Some(&counter), &[]).unwrap();
        assert!(result.is_none());
        assert_eq!(count.get(Some(&counter)).unwrap(), Value::Int(4));

        count.set(Some(&counter), &Value::Int(10)).unwrap();
        assert_eq!(count.get(Some(&counter)).unwrap(), Value::Int(10));
    }

    #[test]
    fn test_registry_factory_is_reusable() {
        let registry = TypeRegistry::new(ENTRIES);
        let factory = registry.create_factory("Counter").unwrap();

        let a = factory(&[]).unwrap();
        let b = factory(&[Value::Int(2)]).unwrap();
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn test_registry_failures() {
        let registry = TypeRegistry::new(ENTRIES);

        assert_eq!(
            registry.create_instance("Nope", &[]).unwrap_err(),
            BindError::UnknownType("Nope".into())
        );
        assert!(registry.create_factory("Nope").is_err());
        assert_eq!(
            registry.create_binding("Counter", "doesNotExist").unwrap_err(),
            BindError::binding_not_found("doesNotExist", "Counter")
        );
        assert_eq!(
            registry
                .create_instance("Counter", &[Value::Int(1), Value::Int(2)])
                .unwrap_err(),
            BindError::Arity {
                type_name: "Counter",
                count: 2
            }
        );
    }

    #[test]
    fn test_receiver_must_match() {
        let registry = TypeRegistry::new(ENTRIES);
        let count = registry.create_binding("Counter", "count").unwrap();
        let count = count.as_property().unwrap();

        assert_eq!(
            count.get(None).unwrap_err(),
            BindError::Receiver {
                type_name: "Counter"
            }
        );
        let other = Instance::new("Other", 5u8);
        assert!(count.get(Some(&other)).is_err());
    }

    #[test]
    fn test_duplicate_entries_keep_first() {
        let registry = TypeRegistry::new(&[
            TypeEntry::of::<Counter>(None),
            TypeEntry::of::<Counter>(Some("Clock")),
        ]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.base_type_name("Counter"), None);
    }
}
