// #[script_type] proc-macro implementation

use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Fields, ItemStruct, Result};

use hostbind_gen::attrs::{self, PropertyAttr, TypeAttr};

use crate::include_generated;

/// Expands the #[script_type] attribute macro.
///
/// Input: annotated struct
/// Output: struct without field annotations + include of its binding table
pub fn expand_script_type(attr: TokenStream, item: TokenStream) -> Result<TokenStream> {
    let type_attr = TypeAttr::from_args(attr)?;
    let mut item: ItemStruct = syn::parse2(item).map_err(|e| {
        syn::Error::new(e.span(), "`#[script_type]` can only be applied to structs")
    })?;

    if !item.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &item.generics,
            "generic types cannot be exposed to scripts",
        ));
    }

    match &mut item.fields {
        Fields::Named(named) => {
            for field in named.named.iter_mut() {
                strip_property(&mut field.attrs)?;
            }
        }
        Fields::Unnamed(unnamed) => {
            for field in unnamed.unnamed.iter() {
                if let Some(attr) = attrs::find_attr(&field.attrs, attrs::SCRIPT_PROPERTY) {
                    return Err(syn::Error::new_spanned(
                        attr,
                        "tuple-struct fields cannot be exposed; use accessor fns",
                    ));
                }
            }
        }
        Fields::Unit => {}
    }

    let exposed = type_attr.exposed_name(&item.ident.unraw().to_string());
    let include = include_generated(&hostbind_gen::artifact_file_name(&exposed));

    Ok(quote! {
        #item
        #include
    })
}

fn strip_property(field_attrs: &mut Vec<syn::Attribute>) -> Result<()> {
    let mut seen = false;
    let mut error = None;
    field_attrs.retain(|attr| {
        if !attrs::is_attr(attr, attrs::SCRIPT_PROPERTY) {
            return true;
        }
        if seen {
            error.get_or_insert_with(|| syn::Error::new_spanned(attr, "duplicate `#[script_property]`"));
        } else if let Err(e) = PropertyAttr::from_attribute(attr) {
            error.get_or_insert(e);
        }
        seen = true;
        false
    });
    match error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expansion_strips_field_annotations() {
        let output = expand_script_type(
            quote!(name = "Vector3"),
            quote! {
                pub struct Vec3 {
                    #[script_property]
                    pub x: f32,
                    #[doc = "kept"]
                    #[script_property(read_only)]
                    y: f32,
                }
            },
        )
        .unwrap()
        .to_string();

        assert!(!output.contains("script_property"));
        assert!(output.contains("# [doc = \"kept\"]"));
        assert!(output.contains("include ! (concat ! (env ! (\"OUT_DIR\") , \"/hostbind/Vector3.rs\"))"));
    }

    #[test]
    fn test_default_name_is_ident() {
        let output = expand_script_type(quote!(), quote!(pub struct Clock;))
            .unwrap()
            .to_string();
        assert!(output.contains("\"/hostbind/Clock.rs\""));
    }

    #[test]
    fn test_rejections() {
        assert!(expand_script_type(quote!(), quote!(pub enum E { A })).is_err());
        assert!(expand_script_type(quote!(), quote!(pub struct G<T> { v: T })).is_err());
        assert!(expand_script_type(quote!(sealed), quote!(pub struct S;)).is_err());
        assert!(expand_script_type(quote!(), quote!(pub struct T(#[script_property] f32);)).is_err());
        assert!(expand_script_type(
            quote!(),
            quote!(pub struct S { #[script_property(writable)] x: f32 })
        )
        .is_err());
    }
}
