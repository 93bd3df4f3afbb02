// #[script_registry] proc-macro implementation

use proc_macro2::TokenStream;
use quote::quote;
use syn::{ItemStruct, Result};

use crate::include_generated;

/// Expands the #[script_registry] attribute macro.
///
/// Input: anchor struct
/// Output: anchor struct + include of the aggregate registry
pub fn expand_script_registry(attr: TokenStream, item: TokenStream) -> Result<TokenStream> {
    if !attr.is_empty() {
        return Err(syn::Error::new_spanned(attr, "`#[script_registry]` takes no arguments"));
    }
    let item: ItemStruct = syn::parse2(item).map_err(|e| {
        syn::Error::new(e.span(), "`#[script_registry]` can only be applied to structs")
    })?;
    if !item.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &item.generics,
            "the registry anchor cannot be generic",
        ));
    }

    let include = include_generated(hostbind_gen::REGISTRY_FILE_NAME);
    Ok(quote! {
        #item
        #include
    })
}
