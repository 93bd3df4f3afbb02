//! Annotation surface
//!
//! Parsers for the `#[script_*]` attributes. Used by discovery (reading
//! attributes off parsed source) and by `hostbind-macros` (reading attribute
//! arguments at expansion), so both agree on names and defaults.

use proc_macro2::TokenStream;
use syn::meta::ParseNestedMeta;
use syn::parse::Parser;
use syn::{Attribute, Expr, ExprLit, ExprUnary, Lit, LitBool, LitStr, Meta, UnOp};

/// Exposes a struct as a script type
pub const SCRIPT_TYPE: &str = "script_type";
/// Marks an impl block whose fns may be exposed
pub const SCRIPT_METHODS: &str = "script_methods";
/// Exposes an associated fn as a constructor
pub const SCRIPT_CONSTRUCTOR: &str = "script_constructor";
/// Exposes a field or accessor fn as a property
pub const SCRIPT_PROPERTY: &str = "script_property";
/// Exposes a fn as a method
pub const SCRIPT_METHOD: &str = "script_method";
/// Marks the struct that receives the aggregate registry
pub const SCRIPT_REGISTRY: &str = "script_registry";
/// Makes a parameter optional
pub const SCRIPT_DEFAULT: &str = "script_default";

/// Attributes that may sit on a fn inside `#[script_methods]`
pub const MEMBER_ATTRIBUTES: &[&str] = &[SCRIPT_CONSTRUCTOR, SCRIPT_PROPERTY, SCRIPT_METHOD];

/// Check whether `attr` is the annotation `name`, by its last path segment
pub fn is_attr(attr: &Attribute, name: &str) -> bool {
    attr.path()
        .segments
        .last()
        .is_some_and(|segment| segment.ident == name)
}

/// Find the annotation `name` in `attrs`
pub fn find_attr<'a>(attrs: &'a [Attribute], name: &str) -> Option<&'a Attribute> {
    attrs.iter().find(|attr| is_attr(attr, name))
}

/// Parse a flag: bare `flag` means true, `flag = bool` is explicit
fn parse_flag(meta: &ParseNestedMeta) -> syn::Result<bool> {
    if meta.input.peek(syn::Token![=]) {
        let lit: LitBool = meta.value()?.parse()?;
        Ok(lit.value)
    } else {
        Ok(true)
    }
}

fn parse_name(meta: &ParseNestedMeta) -> syn::Result<String> {
    let lit: LitStr = meta.value()?.parse()?;
    let name = lit.value();
    if name.is_empty() {
        return Err(syn::Error::new(lit.span(), "exposed name must not be empty"));
    }
    Ok(name)
}

/// Run `logic` over the nested metas of `attr`; a bare path has none
fn parse_attribute(
    attr: &Attribute,
    logic: impl FnMut(ParseNestedMeta) -> syn::Result<()>,
) -> syn::Result<()> {
    match &attr.meta {
        Meta::Path(_) => Ok(()),
        Meta::List(_) => attr.parse_nested_meta(logic),
        Meta::NameValue(nv) => Err(syn::Error::new_spanned(
            nv,
            "expected `#[attr]` or `#[attr(..)]`",
        )),
    }
}

// ============================================================================
// #[script_type]
// ============================================================================

/// Arguments of `#[script_type]`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAttr {
    /// `name = ".."`
    pub name: Option<String>,
    /// `is_static`
    pub is_static: bool,
    /// `is_abstract`
    pub is_abstract: bool,
    /// `inherit_base_members = false`
    pub inherit_base_members: bool,
    /// `base = Path`, rendered as written
    pub base: Option<Vec<String>>,
}

impl Default for TypeAttr {
    fn default() -> Self {
        TypeAttr {
            name: None,
            is_static: false,
            is_abstract: false,
            inherit_base_members: true,
            base: None,
        }
    }
}

impl TypeAttr {
    fn parse_meta(&mut self, meta: ParseNestedMeta) -> syn::Result<()> {
        if meta.path.is_ident("name") {
            let name = parse_name(&meta)?;
            if !is_identifier(&name) {
                return Err(meta.error("exposed type name must be an identifier"));
            }
            self.name = Some(name);
        } else if meta.path.is_ident("is_static") {
            self.is_static = parse_flag(&meta)?;
        } else if meta.path.is_ident("is_abstract") {
            self.is_abstract = parse_flag(&meta)?;
        } else if meta.path.is_ident("inherit_base_members") {
            self.inherit_base_members = parse_flag(&meta)?;
        } else if meta.path.is_ident("base") {
            let path: syn::Path = meta.value()?.parse()?;
            self.base = Some(
                path.segments
                    .iter()
                    .map(|segment| segment.ident.to_string())
                    .collect(),
            );
        } else {
            return Err(meta.error(
                "unknown `script_type` argument; expected `name`, `is_static`, `is_abstract`, `inherit_base_members` or `base`",
            ));
        }
        Ok(())
    }

    /// Parse from an attribute on a declaration
    pub fn from_attribute(attr: &Attribute) -> syn::Result<Self> {
        let mut parsed = TypeAttr::default();
        parse_attribute(attr, |meta| parsed.parse_meta(meta))?;
        Ok(parsed)
    }

    /// Parse from attribute-macro arguments
    pub fn from_args(args: TokenStream) -> syn::Result<Self> {
        let mut parsed = TypeAttr::default();
        syn::meta::parser(|meta| parsed.parse_meta(meta)).parse2(args)?;
        Ok(parsed)
    }

    /// Exposed name for a struct named `ident`
    pub fn exposed_name(&self, ident: &str) -> String {
        self.name.clone().unwrap_or_else(|| ident.to_string())
    }
}

// ============================================================================
// #[script_property] / #[script_method]
// ============================================================================

/// Arguments of `#[script_property]`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyAttr {
    /// `name = ".."`
    pub name: Option<String>,
    /// `read_only`
    pub read_only: bool,
}

impl PropertyAttr {
    /// Parse from an attribute on a field or fn
    pub fn from_attribute(attr: &Attribute) -> syn::Result<Self> {
        let mut parsed = PropertyAttr::default();
        parse_attribute(attr, |meta| {
            if meta.path.is_ident("name") {
                parsed.name = Some(parse_name(&meta)?);
            } else if meta.path.is_ident("read_only") {
                parsed.read_only = parse_flag(&meta)?;
            } else {
                return Err(meta.error(
                    "unknown `script_property` argument; expected `name` or `read_only`",
                ));
            }
            Ok(())
        })?;
        Ok(parsed)
    }
}

/// Arguments of `#[script_method]`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodAttr {
    /// `name = ".."`
    pub name: Option<String>,
}

impl MethodAttr {
    /// Parse from an attribute on a fn
    pub fn from_attribute(attr: &Attribute) -> syn::Result<Self> {
        let mut parsed = MethodAttr::default();
        parse_attribute(attr, |meta| {
            if meta.path.is_ident("name") {
                parsed.name = Some(parse_name(&meta)?);
                Ok(())
            } else {
                Err(meta.error("unknown `script_method` argument; expected `name`"))
            }
        })?;
        Ok(parsed)
    }
}

/// Reject arguments on an annotation that takes none
pub fn expect_no_args(attr: &Attribute) -> syn::Result<()> {
    match &attr.meta {
        Meta::Path(_) => Ok(()),
        other => Err(syn::Error::new_spanned(other, "this attribute takes no arguments")),
    }
}

// ============================================================================
// #[script_default]
// ============================================================================

/// Literal default of an optional parameter, kept as written
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum DefaultLiteral {
    /// Integer literal digits, with sign
    Int(String),
    /// Float literal digits, with sign
    Float(String),
    /// `true`/`false`
    Bool(bool),
    /// String literal contents
    Str(String),
    /// Char literal
    Char(char),
}

/// Parse `#[script_default]` (zero value) or `#[script_default(lit)]`
pub fn parse_default(attr: &Attribute) -> syn::Result<Option<DefaultLiteral>> {
    match &attr.meta {
        Meta::Path(_) => Ok(None),
        Meta::List(list) => {
            let expr: Expr = list.parse_args()?;
            default_from_expr(&expr).map(Some)
        }
        Meta::NameValue(nv) => Err(syn::Error::new_spanned(
            nv,
            "expected `#[script_default]` or `#[script_default(literal)]`",
        )),
    }
}

fn default_from_expr(expr: &Expr) -> syn::Result<DefaultLiteral> {
    match expr {
        Expr::Lit(ExprLit { lit, .. }) => default_from_lit(lit, false),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr: inner,
            ..
        }) => match &**inner {
            Expr::Lit(ExprLit { lit, .. }) => default_from_lit(lit, true),
            other => Err(syn::Error::new_spanned(other, "expected a numeric literal")),
        },
        other => Err(syn::Error::new_spanned(
            other,
            "default must be a literal (number, bool, string or char)",
        )),
    }
}

fn default_from_lit(lit: &Lit, negative: bool) -> syn::Result<DefaultLiteral> {
    let sign = if negative { "-" } else { "" };
    match lit {
        Lit::Int(int) => Ok(DefaultLiteral::Int(format!("{}{}", sign, int.base10_digits()))),
        Lit::Float(float) => Ok(DefaultLiteral::Float(format!(
            "{}{}",
            sign,
            float.base10_digits()
        ))),
        _ if negative => Err(syn::Error::new_spanned(lit, "only numbers can be negated")),
        Lit::Bool(b) => Ok(DefaultLiteral::Bool(b.value)),
        Lit::Str(s) => Ok(DefaultLiteral::Str(s.value())),
        Lit::Char(c) => Ok(DefaultLiteral::Char(c.value())),
        other => Err(syn::Error::new_spanned(other, "unsupported default literal")),
    }
}

/// Check that `name` is a plain identifier (`[A-Za-z_][A-Za-z0-9_]*`)
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
