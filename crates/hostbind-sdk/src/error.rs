//! Error types raised by generated bindings at interpreter call time

/// Result type for binding calls
pub type BindResult<T> = Result<T, BindError>;

/// Failure converting an untyped [`Value`](crate::Value) into a host type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConvertError {
    /// The value has the wrong kind
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type name
        expected: &'static str,
        /// Actual value kind
        got: &'static str,
    },

    /// The value has the right kind but does not fit the target type
    #[error("Value {value} is out of range for {target}")]
    OutOfRange {
        /// Target type name
        target: &'static str,
        /// Rendered source value
        value: String,
    },

    /// An object handle wraps a different host type
    #[error("Expected an instance of `{expected}`, got `{got}`")]
    WrongInstance {
        /// Expected host type
        expected: &'static str,
        /// Exposed class name of the actual object
        got: &'static str,
    },
}

/// Binding failure surfaced to the interpreter
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BindError {
    /// No registered type has this exposed name
    #[error("unknown builtin type `{0}`")]
    UnknownType(String),

    /// The type exposes no member with this name
    #[error("binding not found for `{member}` in `{type_name}`")]
    BindingNotFound {
        /// Requested member name
        member: String,
        /// Exposed type name
        type_name: &'static str,
    },

    /// No constructor overload accepts this many arguments
    #[error("no matching constructor: `{type_name}` has no constructor taking {count} arguments")]
    Arity {
        /// Exposed type name
        type_name: &'static str,
        /// Number of arguments supplied
        count: usize,
    },

    /// A required positional argument was not supplied
    #[error("`{member}` expects an argument at position {index}, got {count} arguments")]
    MissingArgument {
        /// Exposed member name
        member: &'static str,
        /// Ordinal of the missing parameter
        index: usize,
        /// Number of arguments supplied
        count: usize,
    },

    /// Argument or property value conversion failed
    #[error(transparent)]
    Convert(#[from] ConvertError),

    /// The receiver is missing or is not an instance of the bound type
    #[error("expected an instance of `{type_name}` as receiver")]
    Receiver {
        /// Exposed type name
        type_name: &'static str,
    },

    /// The property has no getter
    #[error("property `{member}` of `{type_name}` is not readable")]
    NotReadable {
        /// Exposed member name
        member: String,
        /// Exposed type name
        type_name: &'static str,
    },

    /// The property has no setter, or is read-only
    #[error("property `{member}` of `{type_name}` is not writable")]
    NotWritable {
        /// Exposed member name
        member: String,
        /// Exposed type name
        type_name: &'static str,
    },

    /// The host member returned an error
    #[error("`{member}` failed: {message}")]
    Invocation {
        /// Exposed member name
        member: &'static str,
        /// Rendered host error
        message: String,
    },
}

impl BindError {
    /// Create a `BindingNotFound` error
    pub fn binding_not_found(member: &str, type_name: &'static str) -> Self {
        BindError::BindingNotFound {
            member: member.to_string(),
            type_name,
        }
    }

    /// Create an `Invocation` error from a host error
    pub fn invocation(member: &'static str, error: impl std::fmt::Display) -> Self {
        BindError::Invocation {
            member,
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        assert_eq!(
            BindError::UnknownType("Quaternion".into()).to_string(),
            "unknown builtin type `Quaternion`"
        );
        assert_eq!(
            BindError::binding_not_found("doesNotExist", "Vector3").to_string(),
            "binding not found for `doesNotExist` in `Vector3`"
        );
        let arity = BindError::Arity {
            type_name: "Vector3",
            count: 5,
        };
        assert!(arity.to_string().contains("Vector3"));
        assert!(arity.to_string().contains('5'));
    }

    #[test]
    fn test_convert_error_is_transparent() {
        let err: BindError = ConvertError::TypeMismatch {
            expected: "f32",
            got: "string",
        }
        .into();
        assert_eq!(err.to_string(), "Type mismatch: expected f32, got string");
    }
}
