//! Discovery model
//!
//! Plain data describing the exposed declarations of one run. Types are kept
//! as rendered token text plus a classification, never as `syn` trees, so
//! the model is `Send` and can cross rayon workers and the discovery cache.

use crate::attrs::DefaultLiteral;
use crate::error::Location;

/// Primitive scalar a type resolves to, when it is one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// `bool`
    Bool,
    /// `char`
    Char,
    /// `String`
    String,
    /// `i8`
    I8,
    /// `i16`
    I16,
    /// `i32`
    I32,
    /// `i64`
    I64,
    /// `isize`
    Isize,
    /// `u8`
    U8,
    /// `u16`
    U16,
    /// `u32`
    U32,
    /// `u64`
    U64,
    /// `usize`
    Usize,
    /// `f32`
    F32,
    /// `f64`
    F64,
}

impl Primitive {
    /// Classify a single-segment type name
    pub fn from_ident(ident: &str) -> Option<Self> {
        Some(match ident {
            "bool" => Primitive::Bool,
            "char" => Primitive::Char,
            "String" => Primitive::String,
            "i8" => Primitive::I8,
            "i16" => Primitive::I16,
            "i32" => Primitive::I32,
            "i64" => Primitive::I64,
            "isize" => Primitive::Isize,
            "u8" => Primitive::U8,
            "u16" => Primitive::U16,
            "u32" => Primitive::U32,
            "u64" => Primitive::U64,
            "usize" => Primitive::Usize,
            "f32" => Primitive::F32,
            "f64" => Primitive::F64,
            _ => return None,
        })
    }

    /// Rust spelling, also used as a literal suffix for numbers
    pub fn as_str(self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::Char => "char",
            Primitive::String => "String",
            Primitive::I8 => "i8",
            Primitive::I16 => "i16",
            Primitive::I32 => "i32",
            Primitive::I64 => "i64",
            Primitive::Isize => "isize",
            Primitive::U8 => "u8",
            Primitive::U16 => "u16",
            Primitive::U32 => "u32",
            Primitive::U64 => "u64",
            Primitive::Usize => "usize",
            Primitive::F32 => "f32",
            Primitive::F64 => "f64",
        }
    }

    /// Check if the primitive is an integer type
    pub fn is_integer(self) -> bool {
        !matches!(
            self,
            Primitive::Bool | Primitive::Char | Primitive::String | Primitive::F32 | Primitive::F64
        )
    }

    /// Check if the primitive is a float type
    pub fn is_float(self) -> bool {
        matches!(self, Primitive::F32 | Primitive::F64)
    }
}

/// A host type as written in source
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    /// Token text, re-parsed at synthesis time
    pub text: String,
    /// Set when the type is a known scalar
    pub primitive: Option<Primitive>,
    /// The type is the untyped `Value` carrier itself
    pub is_any: bool,
}

impl TypeRef {
    /// Create a type reference from rendered tokens
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let last = text.rsplit("::").next().unwrap_or(&text).trim();
        TypeRef {
            primitive: Primitive::from_ident(last).filter(|_| !text.contains('<')),
            is_any: is_value_path(&text),
            text,
        }
    }
}

/// `Value` as imported, or spelled through the SDK crate
fn is_value_path(text: &str) -> bool {
    let path: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    matches!(
        path.trim_start_matches("::"),
        "Value" | "hostbind_sdk::Value" | "hostbind_sdk::value::Value"
    )
}

/// How a parameter is handed to the host fn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// By value
    Owned,
    /// `&T`; the binder converts an owned `T` and lends it
    Ref,
}

/// Container of a pass-through argument array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variadic {
    /// `&[Value]`
    Slice,
    /// `Vec<Value>`
    Vec,
}

/// Parameter shape as the binder sees it
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    /// Consumes the whole argument sequence
    Variadic(Variadic),
    /// Positional, must be supplied
    Required,
    /// Positional with a default; `None` means `Default::default()`
    Optional(Option<DefaultLiteral>),
}

/// One declared parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDescriptor {
    /// Parameter ident
    pub name: String,
    /// Position in the argument sequence
    pub ordinal: usize,
    /// Owned type converted from the argument
    pub ty: TypeRef,
    /// By value or by shared reference
    pub pass: Pass,
    /// Binding shape
    pub kind: ParamKind,
}

impl ParamDescriptor {
    /// Check if the parameter takes the whole argument sequence
    pub fn is_variadic(&self) -> bool {
        matches!(self.kind, ParamKind::Variadic(_))
    }
}

/// Receiver of a fn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver {
    /// Associated fn; type-level member
    None,
    /// `&self`
    Ref,
    /// `&mut self`
    Mut,
}

impl Receiver {
    /// Check if the member is type-level
    pub fn is_static(self) -> bool {
        self == Receiver::None
    }
}

/// Return shape of a method
#[derive(Debug, Clone, PartialEq)]
pub enum Returns {
    /// `()` or no return type
    Unit,
    /// A plain value
    Value(TypeRef),
    /// `Result<T, E>`; `None` for `Result<(), E>`
    Fallible(Option<TypeRef>),
}

impl Returns {
    /// Check if the call yields a value
    pub fn has_value(&self) -> bool {
        matches!(self, Returns::Value(_) | Returns::Fallible(Some(_)))
    }
}

/// Struct field exposed as a property
#[derive(Debug, Clone, PartialEq)]
pub struct FieldProperty {
    /// Exposed name
    pub name: String,
    /// Field ident
    pub ident: String,
    /// Field type
    pub ty: TypeRef,
    /// No setter is generated
    pub read_only: bool,
    /// Field position
    pub location: Location,
}

/// Getter or setter fn of an accessor property
#[derive(Debug, Clone, PartialEq)]
pub struct Accessor {
    /// Fn ident
    pub ident: String,
    /// Receiver kind
    pub receiver: Receiver,
    /// Property value type
    pub ty: TypeRef,
    /// Setter parameter passing; `Owned` for getters
    pub pass: Pass,
    /// Fn position
    pub location: Location,
}

/// Which half of an accessor property a fn provides
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorKind {
    /// Reads the property
    Getter,
    /// Writes the property
    Setter,
}

/// Property backed by getter and/or setter fns
#[derive(Debug, Clone, PartialEq)]
pub struct AccessorProperty {
    /// Exposed name
    pub name: String,
    /// Read half
    pub getter: Option<Accessor>,
    /// Write half
    pub setter: Option<Accessor>,
    /// Setter is ignored
    pub read_only: bool,
}

impl AccessorProperty {
    /// Position of the first declared half
    pub fn location(&self) -> Option<&Location> {
        self.getter
            .as_ref()
            .or(self.setter.as_ref())
            .map(|accessor| &accessor.location)
    }

    /// Check if the property is type-level
    pub fn is_static(&self) -> bool {
        self.getter
            .as_ref()
            .or(self.setter.as_ref())
            .is_some_and(|accessor| accessor.receiver.is_static())
    }

    /// Check if a setter binding is generated
    pub fn is_writable(&self) -> bool {
        self.setter.is_some() && !self.read_only
    }
}

/// Exposed method
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDescriptor {
    /// Exposed name
    pub name: String,
    /// Fn ident
    pub ident: String,
    /// Receiver kind
    pub receiver: Receiver,
    /// Declared parameters
    pub params: Vec<ParamDescriptor>,
    /// Return shape
    pub returns: Returns,
    /// Fn position
    pub location: Location,
}

/// Exposed constructor
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorDescriptor {
    /// Fn ident
    pub ident: String,
    /// Declared parameters
    pub params: Vec<ParamDescriptor>,
    /// Returns `Result<Self, E>`
    pub fallible: bool,
    /// Fn position
    pub location: Location,
}

impl ConstructorDescriptor {
    /// Check if the constructor takes the whole argument array
    pub fn is_variadic(&self) -> bool {
        self.params.len() == 1 && self.params[0].is_variadic()
    }

    /// Number of declared parameters
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// One exposed host type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    /// Exposed name
    pub name: String,
    /// Struct ident
    pub ident: String,
    /// Rust module path, starting with `crate`
    pub module_path: Vec<String>,
    /// Struct position
    pub location: Location,
    /// Type-level only
    pub is_static: bool,
    /// Not instantiable
    pub is_abstract: bool,
    /// Base members visible through this type
    pub inherit_base_members: bool,
    /// `base = ..` as written
    pub base_path: Option<Vec<String>>,
    /// Index of the exposed base in the declaration set, after linking
    pub base: Option<usize>,
    /// Field properties, in declaration order
    pub fields: Vec<FieldProperty>,
    /// Accessor properties, in order of first declaration
    pub properties: Vec<AccessorProperty>,
    /// Methods, in declaration order
    pub methods: Vec<MethodDescriptor>,
    /// Constructors, in declaration order
    pub constructors: Vec<ConstructorDescriptor>,
}

impl TypeDescriptor {
    /// Fully qualified Rust path, e.g. `crate::math::Vec3`
    pub fn rust_path(&self) -> String {
        let mut path = self.module_path.join("::");
        path.push_str("::");
        path.push_str(&self.ident);
        path
    }

    /// Exposed member names: fields, then properties, then methods
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .map(|f| f.name.as_str())
            .chain(self.properties.iter().map(|p| p.name.as_str()))
            .chain(self.methods.iter().map(|m| m.name.as_str()))
    }

    /// The argument-array constructor, if declared
    pub fn variadic_constructor(&self) -> Option<&ConstructorDescriptor> {
        self.constructors.iter().find(|c| c.is_variadic())
    }
}

/// `#[script_methods]` block, before it is attached to its type
#[derive(Debug, Clone, PartialEq)]
pub struct ImplScan {
    /// Self type ident
    pub ident: String,
    /// Module the block is declared in
    pub module_path: Vec<String>,
    /// Block position
    pub location: Location,
    /// Constructors in block order
    pub constructors: Vec<ConstructorDescriptor>,
    /// Methods in block order
    pub methods: Vec<MethodDescriptor>,
    /// Accessor halves in block order: exposed name, read-only flag, half
    pub accessors: Vec<(String, bool, AccessorKind, Accessor)>,
}

/// `#[script_registry]` declaration
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorDescriptor {
    /// Struct ident
    pub ident: String,
    /// Module the anchor is declared in
    pub module_path: Vec<String>,
    /// Struct position
    pub location: Location,
}

/// Exposed declarations of a single file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileScan {
    /// Exposed types in source order
    pub types: Vec<TypeDescriptor>,
    /// `#[script_methods]` blocks in source order
    pub impls: Vec<ImplScan>,
    /// Registry anchors in source order
    pub anchors: Vec<AnchorDescriptor>,
}

/// Linked declarations of a whole run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeclarationSet {
    /// Exposed types, deterministic order
    pub types: Vec<TypeDescriptor>,
    /// The registry anchor, if declared
    pub anchor: Option<AnchorDescriptor>,
}

impl DeclarationSet {
    /// Exposed name of the base of `types[index]`, when that base is exposed
    pub fn base_name(&self, index: usize) -> Option<&str> {
        self.types[index]
            .base
            .map(|base| self.types[base].name.as_str())
    }

    /// Find a type by exposed name
    pub fn find(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.iter().find(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_ref_classification() {
        assert_eq!(TypeRef::new("f32").primitive, Some(Primitive::F32));
        assert_eq!(TypeRef::new("std::string::String").primitive, Some(Primitive::String));
        assert_eq!(TypeRef::new("Vec < f32 >").primitive, None);
        assert!(TypeRef::new("hostbind_sdk::Value").is_any);
        assert!(!TypeRef::new("Vec3").is_any);
    }

    #[test]
    fn test_only_sdk_value_is_untyped() {
        assert!(TypeRef::new("Value").is_any);
        assert!(TypeRef::new(":: hostbind_sdk :: Value").is_any);
        assert!(!TypeRef::new("crate :: json :: Value").is_any);
        assert!(!TypeRef::new("serde_json::Value").is_any);
    }

    #[test]
    fn test_primitive_classes() {
        assert!(Primitive::U8.is_integer());
        assert!(!Primitive::F64.is_integer());
        assert!(Primitive::F32.is_float());
        assert!(!Primitive::Bool.is_float());
        assert_eq!(Primitive::Usize.as_str(), "usize");
    }
}
