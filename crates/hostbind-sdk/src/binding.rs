//! Member bindings handed to the interpreter
//!
//! A binding is a plain set of fn pointers produced by generated code. The
//! interpreter resolves a binding once per call site and keeps it; invoking
//! it needs no name lookup.

use crate::class::ScriptClass;
use crate::error::{BindError, BindResult};
use crate::value::{Instance, Value};

/// Property read: `(instance) -> value`
pub type Getter = fn(Option<&Instance>) -> BindResult<Value>;

/// Property write: `(instance, value)`
pub type Setter = fn(Option<&Instance>, &Value) -> BindResult<()>;

/// Method call: `(instance, args) -> value | no value`
pub type Invoker = fn(Option<&Instance>, &[Value]) -> BindResult<Option<Value>>;

/// Getter/setter pair for one exposed property
#[derive(Clone, Copy)]
pub struct PropertyBinding {
    name: &'static str,
    type_name: &'static str,
    getter: Option<Getter>,
    setter: Option<Setter>,
}

impl PropertyBinding {
    /// Create a property binding
    pub const fn new(
        name: &'static str,
        type_name: &'static str,
        getter: Option<Getter>,
        setter: Option<Setter>,
    ) -> Self {
        PropertyBinding {
            name,
            type_name,
            getter,
            setter,
        }
    }

    /// Exposed property name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Check if the property has a getter
    pub fn is_readable(&self) -> bool {
        self.getter.is_some()
    }

    /// Check if the property has a setter
    pub fn is_writable(&self) -> bool {
        self.setter.is_some()
    }

    /// Get the raw getter
    pub fn getter(&self) -> Option<Getter> {
        self.getter
    }

    /// Get the raw setter
    pub fn setter(&self) -> Option<Setter> {
        self.setter
    }

    /// Read the property
    pub fn get(&self, instance: Option<&Instance>) -> BindResult<Value> {
        let getter = self.getter.ok_or_else(|| BindError::NotReadable {
            member: self.name.to_string(),
            type_name: self.type_name,
        })?;
        getter(instance)
    }

    /// Write the property
    pub fn set(&self, instance: Option<&Instance>, value: &Value) -> BindResult<()> {
        let setter = self.setter.ok_or_else(|| BindError::NotWritable {
            member: self.name.to_string(),
            type_name: self.type_name,
        })?;
        setter(instance, value)
    }
}

impl std::fmt::Debug for PropertyBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyBinding")
            .field("name", &self.name)
            .field("readable", &self.is_readable())
            .field("writable", &self.is_writable())
            .finish()
    }
}

/// Invocation thunk for one exposed method
#[derive(Clone, Copy)]
pub struct MethodBinding {
    name: &'static str,
    invoker: Invoker,
}

impl MethodBinding {
    /// Create a method binding
    pub const fn new(name: &'static str, invoker: Invoker) -> Self {
        MethodBinding { name, invoker }
    }

    /// Exposed method name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Call the method. `None` means the method produced no value.
    pub fn invoke(&self, instance: Option<&Instance>, args: &[Value]) -> BindResult<Option<Value>> {
        (self.invoker)(instance, args)
    }
}

impl std::fmt::Debug for MethodBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodBinding")
            .field("name", &self.name)
            .finish()
    }
}

/// Binding resolved from an exposed member name
#[derive(Debug, Clone, Copy)]
pub enum MemberBinding {
    /// Field or accessor property
    Property(PropertyBinding),
    /// Method
    Method(MethodBinding),
}

impl MemberBinding {
    /// Exposed member name
    pub fn name(&self) -> &'static str {
        match self {
            MemberBinding::Property(p) => p.name(),
            MemberBinding::Method(m) => m.name(),
        }
    }

    /// Get the property binding, if this is one
    pub fn as_property(&self) -> Option<&PropertyBinding> {
        match self {
            MemberBinding::Property(p) => Some(p),
            MemberBinding::Method(_) => None,
        }
    }

    /// Get the method binding, if this is one
    pub fn as_method(&self) -> Option<&MethodBinding> {
        match self {
            MemberBinding::Method(m) => Some(m),
            MemberBinding::Property(_) => None,
        }
    }
}

// ============================================================================
// Receiver access (used by generated code)
// ============================================================================

/// Run `f` with a shared borrow of the receiver as `T`.
pub fn with_receiver<T: ScriptClass, R>(
    instance: Option<&Instance>,
    f: impl FnOnce(&T) -> R,
) -> BindResult<R> {
    let receiver = instance
        .and_then(|i| i.downcast_ref::<T>())
        .ok_or(BindError::Receiver {
            type_name: T::CLASS_NAME,
        })?;
    Ok(f(&*receiver))
}

/// Run `f` with an exclusive borrow of the receiver as `T`.
pub fn with_receiver_mut<T: ScriptClass, R>(
    instance: Option<&Instance>,
    f: impl FnOnce(&mut T) -> R,
) -> BindResult<R> {
    let mut receiver = instance
        .and_then(|i| i.downcast_mut::<T>())
        .ok_or(BindError::Receiver {
            type_name: T::CLASS_NAME,
        })?;
    Ok(f(&mut *receiver))
}
