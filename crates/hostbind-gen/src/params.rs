//! Parameter binder
//!
//! Turns a declared parameter list into the statements that bind an untyped
//! argument slice (`__args`) to typed locals, plus the expressions passed to
//! the host fn. Shared by constructors and methods.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use tracing::warn;

use crate::attrs::DefaultLiteral;
use crate::error::{GenError, GenResult, Location};
use crate::model::{
    ConstructorDescriptor, ParamDescriptor, ParamKind, Pass, Primitive, TypeDescriptor, TypeRef,
    Variadic,
};

/// Binding code for one call
#[derive(Debug, Default)]
pub struct BoundParams {
    /// `let` statements converting `__args` into locals
    pub prelude: TokenStream,
    /// Call arguments, in declaration order
    pub args: Vec<TokenStream>,
}

/// Parse rendered type text back into tokens
pub fn parse_type(ty: &TypeRef, location: &Location) -> GenResult<syn::Type> {
    syn::parse_str(&ty.text).map_err(|e| GenError::Unsupported {
        location: location.clone(),
        message: format!("cannot re-parse type `{}`: {}", ty.text, e),
    })
}

/// Bind `params` against `__args` for the member `member`.
pub fn bind_parameters(
    params: &[ParamDescriptor],
    member: &str,
    location: &Location,
) -> GenResult<BoundParams> {
    let mut bound = BoundParams::default();

    for param in params {
        let local = format_ident!("__arg{}", param.ordinal);
        let ordinal = param.ordinal;

        match &param.kind {
            ParamKind::Variadic(Variadic::Slice) => {
                bound.args.push(quote!(__args));
                continue;
            }
            ParamKind::Variadic(Variadic::Vec) => {
                bound.args.push(quote!(__args.to_vec()));
                continue;
            }
            ParamKind::Required => {
                let ty = parse_type(&param.ty, location)?;
                let fetch = quote!(::hostbind_sdk::arg(__args, #ordinal, #member)?);
                bound.prelude.extend(if param.ty.is_any {
                    quote! { let #local: #ty = ::core::clone::Clone::clone(#fetch); }
                } else {
                    quote! { let #local: #ty = ::hostbind_sdk::convert_to::<#ty>(#fetch)?; }
                });
            }
            ParamKind::Optional(default) => {
                let ty = parse_type(&param.ty, location)?;
                let default = render_default(default.as_ref(), &param.ty, location)?;
                let convert = if param.ty.is_any {
                    quote!(::core::clone::Clone::clone(&__args[#ordinal]))
                } else {
                    quote!(::hostbind_sdk::convert_to::<#ty>(&__args[#ordinal])?)
                };
                bound.prelude.extend(quote! {
                    let mut #local: #ty = #default;
                    if __args.len() > #ordinal {
                        #local = #convert;
                    }
                });
            }
        }

        bound.args.push(match param.pass {
            Pass::Owned => quote!(#local),
            Pass::Ref => quote!(&#local),
        });
    }

    Ok(bound)
}

/// Render the default value of an optional parameter of type `ty`.
///
/// `None` is the type's zero value. Numeric literals carry the parameter
/// type's suffix; an integer literal for a float type is widened.
pub fn render_default(
    default: Option<&DefaultLiteral>,
    ty: &TypeRef,
    location: &Location,
) -> GenResult<TokenStream> {
    let Some(default) = default else {
        return Ok(quote!(::core::default::Default::default()));
    };

    let unsupported = |message: String| GenError::Unsupported {
        location: location.clone(),
        message,
    };

    if ty.is_any {
        return Ok(match default {
            DefaultLiteral::Int(digits) => {
                let lit = lex(&format!("{}i64", digits), location)?;
                quote!(::hostbind_sdk::Value::Int(#lit))
            }
            DefaultLiteral::Float(digits) => {
                let lit = lex(&format!("{}f64", digits), location)?;
                quote!(::hostbind_sdk::Value::Float(#lit))
            }
            DefaultLiteral::Bool(b) => quote!(::hostbind_sdk::Value::Bool(#b)),
            DefaultLiteral::Str(s) => quote!(::hostbind_sdk::Value::str(#s)),
            DefaultLiteral::Char(c) => {
                let s = c.to_string();
                quote!(::hostbind_sdk::Value::str(#s))
            }
        });
    }

    let Some(primitive) = ty.primitive else {
        return Err(unsupported(format!(
            "literal defaults need a primitive parameter type, not `{}`; use `#[script_default]`",
            ty.text
        )));
    };

    match (default, primitive) {
        (DefaultLiteral::Int(digits), p) if p.is_integer() => {
            check_int_range(digits, p).map_err(unsupported)?;
            lex(&format!("{}{}", digits, p.as_str()), location)
        }
        (DefaultLiteral::Int(digits), p) if p.is_float() => {
            lex(&format!("{}.0{}", digits, p.as_str()), location)
        }
        (DefaultLiteral::Float(digits), p) if p.is_float() => {
            let digits = if digits.contains(['.', 'e', 'E']) {
                digits.clone()
            } else {
                format!("{}.0", digits)
            };
            lex(&format!("{}{}", digits, p.as_str()), location)
        }
        (DefaultLiteral::Float(digits), p) if p.is_integer() => Err(unsupported(format!(
            "float default `{}` for integer parameter of type `{}`",
            digits,
            p.as_str()
        ))),
        (DefaultLiteral::Bool(b), Primitive::Bool) => Ok(quote!(#b)),
        (DefaultLiteral::Char(c), Primitive::Char) => Ok(quote!(#c)),
        (DefaultLiteral::Str(s), Primitive::String) => Ok(quote!(::std::string::String::from(#s))),
        (DefaultLiteral::Char(c), Primitive::String) => {
            let s = c.to_string();
            Ok(quote!(::std::string::String::from(#s)))
        }
        (other, p) => Err(unsupported(format!(
            "default {:?} does not fit parameter of type `{}`",
            other,
            p.as_str()
        ))),
    }
}

fn lex(text: &str, location: &Location) -> GenResult<TokenStream> {
    text.parse().map_err(|e| GenError::Unsupported {
        location: location.clone(),
        message: format!("invalid default literal `{}`: {}", text, e),
    })
}

fn check_int_range(digits: &str, primitive: Primitive) -> Result<(), String> {
    let value: i128 = digits
        .parse()
        .map_err(|_| format!("integer default `{}` is out of range", digits))?;
    let (min, max): (i128, i128) = match primitive {
        Primitive::I8 => (i8::MIN.into(), i8::MAX.into()),
        Primitive::I16 => (i16::MIN.into(), i16::MAX.into()),
        Primitive::I32 => (i32::MIN.into(), i32::MAX.into()),
        Primitive::I64 | Primitive::Isize => (i64::MIN.into(), i64::MAX.into()),
        Primitive::U8 => (0, u8::MAX.into()),
        Primitive::U16 => (0, u16::MAX.into()),
        Primitive::U32 => (0, u32::MAX.into()),
        Primitive::U64 | Primitive::Usize => (0, u64::MAX.into()),
        _ => return Ok(()),
    };
    if value < min || value > max {
        return Err(format!(
            "integer default `{}` does not fit `{}`",
            digits,
            primitive.as_str()
        ));
    }
    Ok(())
}

// ============================================================================
// Constructor overload plan
// ============================================================================

/// Order in which constructors are tried
#[derive(Debug)]
pub struct ConstructorPlan<'a> {
    /// Exact-arity candidates in declaration order, first of each arity only
    pub exact: Vec<&'a ConstructorDescriptor>,
    /// Argument-array constructor, tried when no arity matches
    pub fallback: Option<&'a ConstructorDescriptor>,
}

/// Compute the overload plan of `ty`.
///
/// Constructors with optional parameters still match on their full
/// parameter count; a later constructor with an already-taken arity is
/// unreachable and logged.
pub fn constructor_plan(ty: &TypeDescriptor) -> ConstructorPlan<'_> {
    let mut exact: Vec<&ConstructorDescriptor> = Vec::new();
    for ctor in ty.constructors.iter().filter(|c| !c.is_variadic()) {
        if let Some(first) = exact.iter().find(|e| e.arity() == ctor.arity()) {
            warn!(
                ty = %ty.name,
                ctor = %ctor.ident,
                shadowed_by = %first.ident,
                arity = ctor.arity(),
                "constructor is unreachable: an earlier constructor has the same arity"
            );
            continue;
        }
        exact.push(ctor);
    }

    ConstructorPlan {
        exact,
        fallback: ty.variadic_constructor(),
    }
}
