//! Conversion between untyped values and host types.
//!
//! Generated bindings call [`convert_to`] for every typed parameter and
//! property write, and [`IntoValue`] for every returned value. The
//! implementations here cover the primitive types; an interpreter with a
//! richer value model adds its own `FromValue` impls for its types.

use crate::class::ScriptClass;
use crate::error::{BindError, BindResult, ConvertError};
use crate::value::{Instance, Value};

/// Convert an untyped value into a host type.
pub trait FromValue: Sized {
    /// Convert, returning an error if the value doesn't fit
    fn from_value(value: &Value) -> Result<Self, ConvertError>;
}

/// Convert a host value into an untyped value.
pub trait IntoValue {
    /// Convert to a `Value`
    fn into_value(self) -> Value;
}

/// Convert `value` to `T`.
#[inline]
pub fn convert_to<T: FromValue>(value: &Value) -> Result<T, ConvertError> {
    T::from_value(value)
}

/// Fetch the positional argument `index` for the member `member`.
#[inline]
pub fn arg<'a>(args: &'a [Value], index: usize, member: &'static str) -> BindResult<&'a Value> {
    args.get(index).ok_or(BindError::MissingArgument {
        member,
        index,
        count: args.len(),
    })
}

/// Copy the host value of type `T` out of an object handle.
///
/// Exposed types that are passed back into host methods by value implement
/// `FromValue` through this.
pub fn instance_of<T: ScriptClass + Clone>(value: &Value) -> Result<T, ConvertError> {
    let instance = value
        .as_instance()
        .ok_or_else(|| mismatch(T::CLASS_NAME, value))?;
    instance
        .downcast_ref::<T>()
        .map(|this| T::clone(&this))
        .ok_or(ConvertError::WrongInstance {
            expected: T::CLASS_NAME,
            got: instance.class_name(),
        })
}

fn mismatch(expected: &'static str, value: &Value) -> ConvertError {
    ConvertError::TypeMismatch {
        expected,
        got: value.kind(),
    }
}

// ============================================================================
// Primitive Type Implementations
// ============================================================================

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        Ok(value.clone())
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        value.as_bool().ok_or_else(|| mismatch("bool", value))
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

const I64_MIN_F64: f64 = i64::MIN as f64;
const I64_END_F64: f64 = 9_223_372_036_854_775_808.0;

macro_rules! int_conversions {
    ($($ty:ty),*) => {$(
        impl FromValue for $ty {
            fn from_value(value: &Value) -> Result<Self, ConvertError> {
                let wide = match value {
                    Value::Int(i) => *i,
                    // Integral floats are accepted; interpreters often have one number type
                    Value::Float(f) if f.fract() == 0.0 && f.is_finite() => {
                        // `as` saturates; 2^63 itself is already out of range
                        if !(I64_MIN_F64..I64_END_F64).contains(f) {
                            return Err(ConvertError::OutOfRange {
                                target: stringify!($ty),
                                value: f.to_string(),
                            });
                        }
                        *f as i64
                    }
                    _ => return Err(mismatch(stringify!($ty), value)),
                };
                <$ty>::try_from(wide).map_err(|_| ConvertError::OutOfRange {
                    target: stringify!($ty),
                    value: wide.to_string(),
                })
            }
        }

        impl IntoValue for $ty {
            fn into_value(self) -> Value {
                Value::Int(self as i64)
            }
        }
    )*};
}

int_conversions!(i8, i16, i32, i64, u8, u16, u32, usize, isize);

impl FromValue for u64 {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        let wide = i64::from_value(value).map_err(|e| match e {
            ConvertError::TypeMismatch { got, .. } => ConvertError::TypeMismatch {
                expected: "u64",
                got,
            },
            ConvertError::OutOfRange { value, .. } => ConvertError::OutOfRange {
                target: "u64",
                value,
            },
            other => other,
        })?;
        u64::try_from(wide).map_err(|_| ConvertError::OutOfRange {
            target: "u64",
            value: wide.to_string(),
        })
    }
}

impl IntoValue for u64 {
    fn into_value(self) -> Value {
        // Values beyond i64::MAX lose integrality rather than wrapping
        i64::try_from(self).map_or(Value::Float(self as f64), Value::Int)
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        value.as_float().ok_or_else(|| mismatch("f64", value))
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        value
            .as_float()
            .map(|f| f as f32)
            .ok_or_else(|| mismatch("f32", value))
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> Value {
        Value::Float(self as f64)
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch("string", value))
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::str(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::str(self)
    }
}

impl FromValue for char {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        let text = value.as_str().ok_or_else(|| mismatch("char", value))?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(ConvertError::OutOfRange {
                target: "char",
                value: text.to_string(),
            }),
        }
    }
}

impl IntoValue for char {
    fn into_value(self) -> Value {
        Value::str(self.to_string())
    }
}

impl FromValue for Instance {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        value
            .as_instance()
            .cloned()
            .ok_or_else(|| mismatch("object", value))
    }
}

impl IntoValue for Instance {
    fn into_value(self) -> Value {
        Value::Object(self)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        self.map_or(Value::Null, IntoValue::into_value)
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Result<Self, ConvertError> {
        value
            .as_array()
            .ok_or_else(|| mismatch("array", value))?
            .iter()
            .map(T::from_value)
            .collect()
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::Array(self.into_iter().map(IntoValue::into_value).collect())
    }
}

// Unit type (for methods that return nothing)
impl IntoValue for () {
    fn into_value(self) -> Value {
        Value::Null
    }
}
