//! Type registry aggregator
//!
//! Combines every exposed type of a run into the registry anchor's
//! `ENTRIES` list and `registry()` accessor, and describes the same
//! registry as a serializable [`RegistryManifest`] for tooling.

use std::collections::{BTreeMap, BTreeSet};

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GenError, GenResult, Location};
use crate::model::{AnchorDescriptor, DeclarationSet, ParamKind, ParamDescriptor};
use crate::synth::GENERATED_HEADER;

/// Name of the registry file under the output directory
pub const REGISTRY_FILE_NAME: &str = "__registry.rs";

/// Generated registry of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryArtifact {
    /// Anchor struct ident
    pub anchor: String,
    /// File name under the output directory
    pub file_name: String,
    /// Rust source
    pub code: String,
}

/// Build the registry artifact for `set`'s anchor.
///
/// Returns `None` when the run declares no anchor; per-type tables are still
/// usable on their own.
pub fn aggregate(set: &DeclarationSet) -> GenResult<Option<RegistryArtifact>> {
    let Some(anchor) = &set.anchor else {
        debug!("no registry anchor declared");
        return Ok(None);
    };

    let tokens = registry_tokens(set, anchor)?;
    debug!(anchor = %anchor.ident, types = set.types.len(), "aggregated registry");
    Ok(Some(RegistryArtifact {
        anchor: anchor.ident.clone(),
        file_name: REGISTRY_FILE_NAME.to_string(),
        code: format!("{}{}\n", GENERATED_HEADER, tokens),
    }))
}

fn registry_tokens(set: &DeclarationSet, anchor: &AnchorDescriptor) -> GenResult<TokenStream> {
    let anchor_ident = format_ident!("{}", anchor.ident);

    let entries = set
        .types
        .iter()
        .enumerate()
        .map(|(index, ty)| {
            let path: syn::Path = syn::parse_str(&ty.rust_path()).map_err(|e| GenError::Unsupported {
                location: ty.location.clone(),
                message: format!("cannot form path `{}`: {}", ty.rust_path(), e),
            })?;
            let base = match set.base_name(index) {
                Some(base) => quote!(::core::option::Option::Some(#base)),
                None => quote!(::core::option::Option::None),
            };
            Ok(quote!(::hostbind_sdk::TypeEntry::of::<#path>(#base)))
        })
        .collect::<GenResult<Vec<_>>>()?;

    Ok(quote! {
        #[automatically_derived]
        #[allow(clippy::all)]
        impl #anchor_ident {
            /// Registration records of every exposed type
            pub const ENTRIES: &'static [::hostbind_sdk::TypeEntry] = &[#(#entries),*];

            /// Process-wide registry of every exposed type
            pub fn registry() -> &'static ::hostbind_sdk::TypeRegistry {
                static REGISTRY: ::hostbind_sdk::__private::Lazy<::hostbind_sdk::TypeRegistry> =
                    ::hostbind_sdk::__private::Lazy::new(|| {
                        ::hostbind_sdk::TypeRegistry::new(#anchor_ident::ENTRIES)
                    });
                &REGISTRY
            }
        }
    })
}

// ============================================================================
// Manifest
// ============================================================================

/// Kind of an exposed member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    /// Struct field
    Field,
    /// Getter/setter fns
    Property,
    /// Method
    Method,
}

/// Accepted argument counts of a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arity {
    /// Fewest arguments accepted
    pub min: usize,
    /// Most arguments accepted; `None` for an argument array
    pub max: Option<usize>,
}

impl Arity {
    /// Arity of a declared parameter list
    pub fn of(params: &[ParamDescriptor]) -> Self {
        if params.iter().any(ParamDescriptor::is_variadic) {
            return Arity { min: 0, max: None };
        }
        Arity {
            min: params
                .iter()
                .filter(|p| p.kind == ParamKind::Required)
                .count(),
            max: Some(params.len()),
        }
    }
}

/// One exposed member in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberManifest {
    /// Exposed name
    pub name: String,
    /// Member kind
    pub kind: MemberKind,
    /// Type-level member
    pub is_static: bool,
    /// Has a getter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readable: Option<bool>,
    /// Has a setter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writable: Option<bool>,
    /// Accepted argument counts, for methods
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arity: Option<Arity>,
}

/// One exposed type in the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeManifest {
    /// Exposed name
    pub name: String,
    /// Rust path
    pub rust_path: String,
    /// Exposed base type
    pub base: Option<String>,
    /// Type-level only
    pub is_static: bool,
    /// Not instantiable
    pub is_abstract: bool,
    /// Base members visible through this type
    pub inherit_base_members: bool,
    /// Members in index order
    pub members: Vec<MemberManifest>,
    /// Constructor arities in declaration order
    pub constructors: Vec<Arity>,
    /// Declaration position
    pub location: Location,
}

/// Serializable description of the registry of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryManifest {
    /// Anchor struct path, if declared
    pub anchor: Option<String>,
    /// Exposed types in registration order
    pub types: Vec<TypeManifest>,
}

impl RegistryManifest {
    /// Describe `set`
    pub fn from_declarations(set: &DeclarationSet) -> Self {
        let types = set
            .types
            .iter()
            .enumerate()
            .map(|(index, ty)| {
                let fields = ty.fields.iter().map(|field| MemberManifest {
                    name: field.name.clone(),
                    kind: MemberKind::Field,
                    is_static: false,
                    readable: Some(true),
                    writable: Some(!field.read_only),
                    arity: None,
                });
                let properties = ty.properties.iter().map(|property| MemberManifest {
                    name: property.name.clone(),
                    kind: MemberKind::Property,
                    is_static: property.is_static(),
                    readable: Some(property.getter.is_some()),
                    writable: Some(property.is_writable()),
                    arity: None,
                });
                let methods = ty.methods.iter().map(|method| MemberManifest {
                    name: method.name.clone(),
                    kind: MemberKind::Method,
                    is_static: method.receiver.is_static(),
                    readable: None,
                    writable: None,
                    arity: Some(Arity::of(&method.params)),
                });

                TypeManifest {
                    name: ty.name.clone(),
                    rust_path: ty.rust_path(),
                    base: set.base_name(index).map(str::to_string),
                    is_static: ty.is_static,
                    is_abstract: ty.is_abstract,
                    inherit_base_members: ty.inherit_base_members,
                    members: fields.chain(properties).chain(methods).collect(),
                    constructors: ty.constructors.iter().map(|c| Arity::of(&c.params)).collect(),
                    location: ty.location.clone(),
                }
            })
            .collect();

        RegistryManifest {
            anchor: set.anchor.as_ref().map(|anchor| {
                let mut path = anchor.module_path.join("::");
                path.push_str("::");
                path.push_str(&anchor.ident);
                path
            }),
            types,
        }
    }

    /// Type name → exposed base type name
    pub fn base_type_names(&self) -> BTreeMap<&str, &str> {
        self.types
            .iter()
            .filter_map(|ty| ty.base.as_deref().map(|base| (ty.name.as_str(), base)))
            .collect()
    }

    /// Static type names
    pub fn static_type_names(&self) -> BTreeSet<&str> {
        self.types
            .iter()
            .filter(|ty| ty.is_static)
            .map(|ty| ty.name.as_str())
            .collect()
    }

    /// Abstract type names
    pub fn abstract_type_names(&self) -> BTreeSet<&str> {
        self.types
            .iter()
            .filter(|ty| ty.is_abstract)
            .map(|ty| ty.name.as_str())
            .collect()
    }

    /// Member names of `type_name`, in index order
    pub fn member_names(&self, type_name: &str) -> Option<Vec<&str>> {
        self.types
            .iter()
            .find(|ty| ty.name == type_name)
            .map(|ty| ty.members.iter().map(|m| m.name.as_str()).collect())
    }

    /// Render as pretty JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
