//! Value — the untyped carrier passed between the interpreter and bindings
//!
//! The interpreter owns its own value model; `Value` is only the shape the
//! generated glue accepts and returns. Host objects travel as [`Instance`]
//! handles, which share one lock-protected host value between every script
//! reference to it.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Untyped script value.
#[derive(Clone, Default)]
pub enum Value {
    /// Absence of a value
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Integer (all script integers are widened to 64 bits)
    Int(i64),
    /// Floating point number
    Float(f64),
    /// Immutable string
    Str(Arc<str>),
    /// Ordered list of values
    Array(Vec<Value>),
    /// Host object created through a binding table
    Object(Instance),
}

impl Value {
    /// Create a string value
    pub fn str(s: impl AsRef<str>) -> Self {
        Value::Str(Arc::from(s.as_ref()))
    }

    /// Check if this is `Null`
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as bool if this is a `Bool`
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 if this is an `Int`
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64, widening integers
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get as string slice if this is a `Str`
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the element slice if this is an `Array`
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Get the instance handle if this is an `Object`
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Object(instance) => Some(instance),
            _ => None,
        }
    }

    /// Short name of the variant, used in conversion errors
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Int(i) => write!(f, "Int({})", i),
            Value::Float(x) => write!(f, "Float({})", x),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Array(items) => f.debug_tuple("Array").field(items).finish(),
            Value::Object(instance) => write!(f, "Object({})", instance.class_name()),
        }
    }
}

// ============================================================================
// Instance
// ============================================================================

type Slot = RwLock<Box<dyn Any + Send + Sync>>;

/// Shared handle to a host object.
///
/// Cloning an `Instance` clones the handle, not the object. The exposed class
/// name is recorded at construction so errors and the interpreter can name
/// the type without downcasting.
#[derive(Clone)]
pub struct Instance {
    class_name: &'static str,
    slot: Arc<Slot>,
}

impl Instance {
    /// Wrap a host value under its exposed class name
    pub fn new<T: Any + Send + Sync>(class_name: &'static str, value: T) -> Self {
        Instance {
            class_name,
            slot: Arc::new(RwLock::new(Box::new(value))),
        }
    }

    /// Exposed class name of the wrapped value
    pub fn class_name(&self) -> &'static str {
        self.class_name
    }

    /// Check whether the wrapped value is a `T`
    pub fn is<T: Any>(&self) -> bool {
        self.slot.read().is::<T>()
    }

    /// Check whether two handles refer to the same object
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }

    /// Borrow the wrapped value as `T`.
    ///
    /// Returns `None` when the object is not a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<InstanceRef<'_, T>> {
        let guard = self.slot.read();
        if !guard.is::<T>() {
            return None;
        }
        Some(InstanceRef {
            guard,
            _marker: std::marker::PhantomData,
        })
    }

    /// Mutably borrow the wrapped value as `T`.
    ///
    /// Returns `None` when the object is not a `T`.
    pub fn downcast_mut<T: Any>(&self) -> Option<InstanceMut<'_, T>> {
        let guard = self.slot.write();
        if !guard.is::<T>() {
            return None;
        }
        Some(InstanceMut {
            guard,
            _marker: std::marker::PhantomData,
        })
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance({})", self.class_name)
    }
}

/// Shared borrow of an instance's host value
pub struct InstanceRef<'a, T> {
    guard: RwLockReadGuard<'a, Box<dyn Any + Send + Sync>>,
    _marker: std::marker::PhantomData<&'a T>,
}

impl<T: Any> std::ops::Deref for InstanceRef<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Type checked in `Instance::downcast_ref`
        self.guard
            .downcast_ref::<T>()
            .unwrap_or_else(|| unreachable!("instance type checked on borrow"))
    }
}

/// Exclusive borrow of an instance's host value
pub struct InstanceMut<'a, T> {
    guard: RwLockWriteGuard<'a, Box<dyn Any + Send + Sync>>,
    _marker: std::marker::PhantomData<&'a mut T>,
}

impl<T: Any> std::ops::Deref for InstanceMut<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.guard
            .downcast_ref::<T>()
            .unwrap_or_else(|| unreachable!("instance type checked on borrow"))
    }
}

impl<T: Any> std::ops::DerefMut for InstanceMut<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.guard
            .downcast_mut::<T>()
            .unwrap_or_else(|| unreachable!("instance type checked on borrow"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Counter {
        count: i32,
    }

    #[test]
    fn test_value_accessors() {
        assert!(Value::Null.is_null());
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Int(7).as_int(), Some(7));
        assert_eq!(Value::Int(7).as_float(), Some(7.0));
        assert_eq!(Value::Float(2.5).as_float(), Some(2.5));
        assert_eq!(Value::str("hi").as_str(), Some("hi"));
        assert_eq!(Value::Float(2.5).as_int(), None);
        assert_eq!(Value::Array(vec![Value::Null]).kind(), "array");
    }

    #[test]
    fn test_instance_shares_state() {
        let a = Instance::new("Counter", Counter { count: 1 });
        let b = a.clone();

        b.downcast_mut::<Counter>().unwrap().count += 1;

        assert_eq!(a.downcast_ref::<Counter>().unwrap().count, 2);
        assert!(a.ptr_eq(&b));
        assert_eq!(a.class_name(), "Counter");
    }

    #[test]
    fn test_instance_wrong_type() {
        let a = Instance::new("Counter", Counter { count: 1 });
        assert!(a.is::<Counter>());
        assert!(!a.is::<String>());
        assert!(a.downcast_ref::<String>().is_none());
        assert!(a.downcast_mut::<i32>().is_none());
    }

    #[test]
    fn test_object_equality_is_identity() {
        let a = Instance::new("Counter", Counter { count: 1 });
        let b = Instance::new("Counter", Counter { count: 1 });
        assert_eq!(Value::Object(a.clone()), Value::Object(a.clone()));
        assert_ne!(Value::Object(a), Value::Object(b));
    }
}
