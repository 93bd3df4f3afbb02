// #[script_methods] proc-macro implementation
//
// Validates member annotations and removes them, so the impl block compiles
// as plain Rust. Bindings themselves come from the generated table.

use proc_macro2::TokenStream;
use quote::ToTokens;
use syn::{Attribute, FnArg, ImplItem, ItemImpl, Result};

use hostbind_gen::attrs::{self, MethodAttr, PropertyAttr};

/// Expands the #[script_methods] attribute macro.
pub fn expand_script_methods(attr: TokenStream, item: TokenStream) -> Result<TokenStream> {
    if !attr.is_empty() {
        return Err(syn::Error::new_spanned(attr, "`#[script_methods]` takes no arguments"));
    }
    let mut item: ItemImpl = syn::parse2(item).map_err(|e| {
        syn::Error::new(e.span(), "`#[script_methods]` can only be applied to impl blocks")
    })?;
    if let Some((_, path, _)) = &item.trait_ {
        return Err(syn::Error::new_spanned(
            path,
            "`#[script_methods]` must be placed on an inherent impl block",
        ));
    }

    for impl_item in item.items.iter_mut() {
        let ImplItem::Fn(function) = impl_item else {
            continue;
        };
        check_member_attrs(&function.attrs)?;
        function
            .attrs
            .retain(|attr| !attrs::MEMBER_ATTRIBUTES.iter().any(|name| attrs::is_attr(attr, name)));

        for input in function.sig.inputs.iter_mut() {
            if let FnArg::Typed(pat_type) = input {
                for attr in pat_type.attrs.iter().filter(|a| attrs::is_attr(a, attrs::SCRIPT_DEFAULT)) {
                    attrs::parse_default(attr)?;
                }
                pat_type.attrs.retain(|attr| !attrs::is_attr(attr, attrs::SCRIPT_DEFAULT));
            }
        }
    }

    Ok(item.into_token_stream())
}

fn check_member_attrs(fn_attrs: &[Attribute]) -> Result<()> {
    let mut found: Option<&Attribute> = None;
    for attr in fn_attrs {
        if attrs::is_attr(attr, attrs::SCRIPT_CONSTRUCTOR) {
            attrs::expect_no_args(attr)?;
        } else if attrs::is_attr(attr, attrs::SCRIPT_METHOD) {
            MethodAttr::from_attribute(attr)?;
        } else if attrs::is_attr(attr, attrs::SCRIPT_PROPERTY) {
            PropertyAttr::from_attribute(attr)?;
        } else {
            continue;
        }
        if found.replace(attr).is_some() {
            return Err(syn::Error::new_spanned(
                attr,
                "a fn may carry only one of `script_constructor`, `script_method` or `script_property`",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quote::quote;

    #[test]
    fn test_member_annotations_are_stripped() {
        let output = expand_script_methods(
            quote!(),
            quote! {
                impl Vec3 {
                    #[script_constructor]
                    pub fn new(x: f32) -> Self { Vec3 { x } }

                    #[script_method(name = "move")]
                    #[inline]
                    pub fn translate(&mut self, #[script_default(1.0)] distance: f32) {
                        self.x += distance;
                    }

                    pub fn plain(&self) {}
                }
            },
        )
        .unwrap()
        .to_string();

        assert!(!output.contains("script_"));
        assert!(output.contains("# [inline]"));
        assert!(output.contains("distance : f32"));
    }

    #[test]
    fn test_rejections() {
        assert!(expand_script_methods(quote!(x), quote!(impl A {})).is_err());
        assert!(expand_script_methods(quote!(), quote!(struct A;)).is_err());
        assert!(expand_script_methods(quote!(), quote!(impl Clone for A {})).is_err());
        assert!(expand_script_methods(
            quote!(),
            quote!(impl A { #[script_method] #[script_property] fn f(&self) -> i32 { 0 } })
        )
        .is_err());
        assert!(expand_script_methods(
            quote!(),
            quote!(impl A { #[script_constructor(fast)] fn new() -> Self { A } })
        )
        .is_err());
        assert!(expand_script_methods(
            quote!(),
            quote!(impl A { #[script_method] fn f(&self, #[script_default(1 + 1)] x: i32) {} })
        )
        .is_err());
    }
}
