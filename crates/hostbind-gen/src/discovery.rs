//! Member discovery
//!
//! Scans the declarations of a run for `#[script_type]` structs, their
//! `#[script_methods]` impl blocks and the `#[script_registry]` anchor, and
//! produces the linked [`DeclarationSet`] the synthesizer works from.
//!
//! Each file is scanned on its own (in parallel); [`link`] then attaches impl
//! blocks to their types, resolves bases and validates uniqueness. Files are
//! visited in path order and items in source order, so the output order only
//! depends on the input.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use quote::ToTokens;
use rayon::prelude::*;
use syn::ext::IdentExt;
use syn::spanned::Spanned;
use syn::{
    Fields, FnArg, GenericArgument, ImplItem, ImplItemFn, Item, ItemImpl, ItemStruct, Pat,
    PathArguments, ReturnType, Signature, Type,
};
use tracing::{debug, trace};

use crate::attrs::{self, MethodAttr, PropertyAttr, TypeAttr};
use crate::cache::{self, DiscoveryCache};
use crate::cancel::CancellationToken;
use crate::error::{GenError, GenResult, Location};
use crate::model::{
    Accessor, AccessorKind, AccessorProperty, AnchorDescriptor, ConstructorDescriptor,
    DeclarationSet, FieldProperty, FileScan, ImplScan, MethodDescriptor, ParamDescriptor,
    ParamKind, Pass, Receiver, Returns, TypeDescriptor, TypeRef, Variadic,
};
use crate::source::{SourceFile, SourceSet};

/// Discover and link the exposed declarations of `sources`.
pub fn discover(
    sources: &SourceSet,
    cache: Option<&DiscoveryCache>,
    cancel: &CancellationToken,
) -> GenResult<DeclarationSet> {
    let scans = sources
        .files()
        .par_iter()
        .map(|file| {
            cancel.check()?;
            scan_cached(file, cache)
        })
        .collect::<GenResult<Vec<_>>>()?;

    cancel.check()?;
    link(scans.iter().map(|scan| scan.as_ref()))
}

fn scan_cached(file: &SourceFile, cache: Option<&DiscoveryCache>) -> GenResult<Arc<FileScan>> {
    let Some(cache) = cache else {
        return scan_file(file).map(Arc::new);
    };

    let digest = cache::digest(file);
    if let Some(scan) = cache.get(file, &digest) {
        trace!(path = %file.path.display(), "discovery cache hit");
        return Ok(scan);
    }
    let scan = Arc::new(scan_file(file)?);
    cache.insert(file, digest, Arc::clone(&scan));
    Ok(scan)
}

// ============================================================================
// Per-file scan
// ============================================================================

/// Scan one file for exposed declarations.
///
/// Files that never mention an annotation are not parsed.
pub fn scan_file(file: &SourceFile) -> GenResult<FileScan> {
    let mut scan = FileScan::default();
    if !file.text.contains("script_") {
        return Ok(scan);
    }

    let parsed = syn::parse_file(&file.text).map_err(|e| GenError::Parse {
        location: Location::new(&file.path, e.span()),
        message: e.to_string(),
    })?;

    let mut scanner = Scanner {
        path: &file.path,
        scan: &mut scan,
    };
    scanner.items(&parsed.items, &file.module_path)?;

    debug!(
        path = %file.path.display(),
        types = scan.types.len(),
        impls = scan.impls.len(),
        anchors = scan.anchors.len(),
        "scanned source"
    );
    Ok(scan)
}

struct Scanner<'a> {
    path: &'a Path,
    scan: &'a mut FileScan,
}

impl Scanner<'_> {
    fn items(&mut self, items: &[Item], module_path: &[String]) -> GenResult<()> {
        for item in items {
            match item {
                Item::Struct(item) => self.item_struct(item, module_path)?,
                Item::Impl(item) => {
                    if attrs::find_attr(&item.attrs, attrs::SCRIPT_METHODS).is_some() {
                        let scanned = self.item_impl(item, module_path)?;
                        self.scan.impls.push(scanned);
                    }
                }
                Item::Mod(item) => {
                    if let Some((_, content)) = &item.content {
                        let mut nested = module_path.to_vec();
                        nested.push(item.ident.unraw().to_string());
                        self.items(content, &nested)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn location(&self, span: proc_macro2::Span) -> Location {
        Location::new(self.path, span)
    }

    fn unsupported(&self, span: proc_macro2::Span, message: impl Into<String>) -> GenError {
        GenError::unsupported(self.path, span, message)
    }

    fn item_struct(&mut self, item: &ItemStruct, module_path: &[String]) -> GenResult<()> {
        let type_attr = attrs::find_attr(&item.attrs, attrs::SCRIPT_TYPE);
        let anchor_attr = attrs::find_attr(&item.attrs, attrs::SCRIPT_REGISTRY);

        if let Some(attr) = anchor_attr {
            if type_attr.is_some() {
                return Err(self.unsupported(
                    item.ident.span(),
                    "a registry anchor cannot also be an exposed type",
                ));
            }
            attrs::expect_no_args(attr).map_err(|e| GenError::from_syn(self.path, &e))?;
            self.scan.anchors.push(AnchorDescriptor {
                ident: item.ident.to_string(),
                module_path: module_path.to_vec(),
                location: self.location(item.ident.span()),
            });
            return Ok(());
        }

        let Some(attr) = type_attr else {
            return Ok(());
        };
        let type_attr = TypeAttr::from_attribute(attr).map_err(|e| GenError::from_syn(self.path, &e))?;
        if !item.generics.params.is_empty() {
            return Err(self.unsupported(
                item.generics.span(),
                format!("generic type `{}` cannot be exposed", item.ident),
            ));
        }

        let mut fields = Vec::new();
        match &item.fields {
            Fields::Named(named) => {
                for field in &named.named {
                    let Some(attr) = attrs::find_attr(&field.attrs, attrs::SCRIPT_PROPERTY) else {
                        continue;
                    };
                    let property = PropertyAttr::from_attribute(attr)
                        .map_err(|e| GenError::from_syn(self.path, &e))?;
                    // Named fields always have an ident
                    let Some(ident) = &field.ident else { continue };
                    fields.push(FieldProperty {
                        name: property.name.unwrap_or_else(|| ident.unraw().to_string()),
                        ident: ident.to_string(),
                        ty: type_ref(&field.ty),
                        read_only: property.read_only,
                        location: self.location(ident.span()),
                    });
                }
            }
            Fields::Unnamed(unnamed) => {
                if let Some(field) = unnamed
                    .unnamed
                    .iter()
                    .find(|f| attrs::find_attr(&f.attrs, attrs::SCRIPT_PROPERTY).is_some())
                {
                    return Err(self.unsupported(
                        field.span(),
                        "tuple-struct fields cannot be exposed; use accessor fns",
                    ));
                }
            }
            Fields::Unit => {}
        }

        let ident = item.ident.to_string();
        self.scan.types.push(TypeDescriptor {
            name: type_attr.exposed_name(&item.ident.unraw().to_string()),
            ident,
            module_path: module_path.to_vec(),
            location: self.location(item.ident.span()),
            is_static: type_attr.is_static,
            is_abstract: type_attr.is_abstract,
            inherit_base_members: type_attr.inherit_base_members,
            base_path: type_attr.base,
            base: None,
            fields,
            properties: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
        });
        Ok(())
    }

    fn item_impl(&self, item: &ItemImpl, module_path: &[String]) -> GenResult<ImplScan> {
        if let Some((_, path, _)) = &item.trait_ {
            return Err(self.unsupported(
                path.span(),
                "`#[script_methods]` must be placed on an inherent impl block",
            ));
        }
        if !item.generics.params.is_empty() {
            return Err(self.unsupported(item.generics.span(), "generic impl blocks cannot be exposed"));
        }
        let ident = match &*item.self_ty {
            Type::Path(type_path)
                if type_path.qself.is_none()
                    && type_path.path.segments.len() == 1
                    && type_path.path.segments[0].arguments.is_none() =>
            {
                type_path.path.segments[0].ident.to_string()
            }
            other => {
                return Err(self.unsupported(
                    other.span(),
                    "`#[script_methods]` self type must be a struct declared in this module",
                ))
            }
        };

        let mut scanned = ImplScan {
            ident,
            module_path: module_path.to_vec(),
            location: self.location(item.impl_token.span),
            constructors: Vec::new(),
            methods: Vec::new(),
            accessors: Vec::new(),
        };

        let self_ident = scanned.ident.clone();
        for impl_item in &item.items {
            if let ImplItem::Fn(function) = impl_item {
                self.impl_fn(function, &self_ident, &mut scanned)?;
            }
        }
        Ok(scanned)
    }

    fn impl_fn(&self, function: &ImplItemFn, self_ident: &str, scanned: &mut ImplScan) -> GenResult<()> {
        let mut member_attrs = function
            .attrs
            .iter()
            .filter(|attr| attrs::MEMBER_ATTRIBUTES.iter().any(|name| attrs::is_attr(attr, name)));
        let Some(attr) = member_attrs.next() else {
            return Ok(());
        };
        if let Some(extra) = member_attrs.next() {
            return Err(GenError::InvalidAttribute {
                location: self.location(extra.span()),
                message: "a fn may carry only one of `script_constructor`, `script_method` or `script_property`"
                    .into(),
            });
        }

        let sig = &function.sig;
        self.check_signature(sig)?;
        let receiver = self.receiver(sig)?;
        let params = self.params(sig)?;
        let location = self.location(sig.ident.span());
        let fn_name = sig.ident.unraw().to_string();

        if attrs::is_attr(attr, attrs::SCRIPT_CONSTRUCTOR) {
            attrs::expect_no_args(attr).map_err(|e| GenError::from_syn(self.path, &e))?;
            if receiver != Receiver::None {
                return Err(self.unsupported(sig.ident.span(), "constructors must be associated fns without `self`"));
            }
            let fallible = self.constructor_returns(sig, self_ident)?;
            scanned.constructors.push(ConstructorDescriptor {
                ident: sig.ident.to_string(),
                params,
                fallible,
                location,
            });
        } else if attrs::is_attr(attr, attrs::SCRIPT_METHOD) {
            let method = MethodAttr::from_attribute(attr).map_err(|e| GenError::from_syn(self.path, &e))?;
            scanned.methods.push(MethodDescriptor {
                name: method.name.unwrap_or(fn_name),
                ident: sig.ident.to_string(),
                receiver,
                params,
                returns: returns(&sig.output),
                location,
            });
        } else {
            let property = PropertyAttr::from_attribute(attr).map_err(|e| GenError::from_syn(self.path, &e))?;
            let returns = returns(&sig.output);
            let (kind, ty, pass) = match (params.as_slice(), returns) {
                ([], Returns::Value(ty)) => (AccessorKind::Getter, ty, Pass::Owned),
                ([param], Returns::Unit) if param.kind == ParamKind::Required => {
                    (AccessorKind::Setter, param.ty.clone(), param.pass)
                }
                _ => {
                    return Err(self.unsupported(
                        sig.ident.span(),
                        "property accessors must be a getter (no parameters, returns a value) \
                         or a setter (one required parameter, no return value)",
                    ))
                }
            };
            let name = property.name.unwrap_or_else(|| {
                let prefix = match kind {
                    AccessorKind::Getter => "get_",
                    AccessorKind::Setter => "set_",
                };
                match fn_name.strip_prefix(prefix) {
                    Some(rest) if !rest.is_empty() => rest.to_string(),
                    _ => fn_name.clone(),
                }
            });
            scanned.accessors.push((
                name,
                property.read_only,
                kind,
                Accessor {
                    ident: sig.ident.to_string(),
                    receiver,
                    ty,
                    pass,
                    location,
                },
            ));
        }
        Ok(())
    }

    fn check_signature(&self, sig: &Signature) -> GenResult<()> {
        if sig.asyncness.is_some() {
            return Err(self.unsupported(sig.asyncness.span(), "async fns cannot be exposed"));
        }
        if !sig.generics.params.is_empty() {
            return Err(self.unsupported(sig.generics.span(), "generic fns cannot be exposed"));
        }
        if sig.variadic.is_some() {
            return Err(self.unsupported(sig.variadic.span(), "C-variadic fns cannot be exposed"));
        }
        Ok(())
    }

    fn receiver(&self, sig: &Signature) -> GenResult<Receiver> {
        let Some(FnArg::Receiver(receiver)) = sig.inputs.first() else {
            return Ok(Receiver::None);
        };
        if receiver.reference.is_none() || receiver.colon_token.is_some() {
            return Err(self.unsupported(
                receiver.span(),
                "receiver must be `&self` or `&mut self`",
            ));
        }
        Ok(if receiver.mutability.is_some() {
            Receiver::Mut
        } else {
            Receiver::Ref
        })
    }

    fn params(&self, sig: &Signature) -> GenResult<Vec<ParamDescriptor>> {
        let typed: Vec<_> = sig
            .inputs
            .iter()
            .filter_map(|input| match input {
                FnArg::Typed(pat_type) => Some(pat_type),
                FnArg::Receiver(_) => None,
            })
            .collect();

        let mut params = Vec::with_capacity(typed.len());
        let mut seen_optional = false;
        for (ordinal, pat_type) in typed.iter().enumerate() {
            let name = match &*pat_type.pat {
                Pat::Ident(pat) if pat.by_ref.is_none() && pat.subpat.is_none() => {
                    pat.ident.unraw().to_string()
                }
                other => {
                    return Err(self.unsupported(other.span(), "parameters must be plain identifiers"))
                }
            };

            let default = match attrs::find_attr(&pat_type.attrs, attrs::SCRIPT_DEFAULT) {
                Some(attr) => {
                    Some(attrs::parse_default(attr).map_err(|e| GenError::from_syn(self.path, &e))?)
                }
                None => None,
            };

            let (ty, pass, variadic) = self.param_type(&pat_type.ty)?;
            let kind = match (variadic, default) {
                (Some(_), Some(_)) => {
                    return Err(self.unsupported(
                        pat_type.span(),
                        "an argument-array parameter cannot have a default",
                    ))
                }
                (Some(_), None) if typed.len() > 1 => {
                    return Err(self.unsupported(
                        pat_type.span(),
                        "an argument-array parameter must be the only parameter",
                    ))
                }
                (Some(variadic), None) => ParamKind::Variadic(variadic),
                (None, Some(default)) => {
                    seen_optional = true;
                    ParamKind::Optional(default)
                }
                (None, None) if seen_optional => {
                    return Err(self.unsupported(
                        pat_type.span(),
                        "required parameters cannot follow optional ones",
                    ))
                }
                (None, None) => ParamKind::Required,
            };

            params.push(ParamDescriptor {
                name,
                ordinal,
                ty,
                pass,
                kind,
            });
        }
        Ok(params)
    }

    /// Owned conversion type, passing mode and argument-array shape of a parameter type
    fn param_type(&self, ty: &Type) -> GenResult<(TypeRef, Pass, Option<Variadic>)> {
        match ty {
            Type::Reference(reference) => {
                if reference.mutability.is_some() {
                    return Err(self.unsupported(ty.span(), "`&mut` parameters cannot be bound"));
                }
                match &*reference.elem {
                    Type::Slice(slice) if is_value_type(&slice.elem) => {
                        Ok((type_ref(&reference.elem), Pass::Ref, Some(Variadic::Slice)))
                    }
                    Type::Slice(slice) => Ok((
                        TypeRef::new(format!("Vec<{}>", slice.elem.to_token_stream())),
                        Pass::Ref,
                        None,
                    )),
                    Type::Path(path) if path.qself.is_none() && path.path.is_ident("str") => {
                        Ok((TypeRef::new("String"), Pass::Ref, None))
                    }
                    elem => Ok((type_ref(elem), Pass::Ref, None)),
                }
            }
            Type::Path(_) if vec_of_value(ty) => Ok((type_ref(ty), Pass::Owned, Some(Variadic::Vec))),
            Type::ImplTrait(_) => Err(self.unsupported(ty.span(), "`impl Trait` parameters cannot be bound")),
            _ => Ok((type_ref(ty), Pass::Owned, None)),
        }
    }

    /// `Ok(false)` for `Self`, `Ok(true)` for `Result<Self, E>`
    fn constructor_returns(&self, sig: &Signature, self_ident: &str) -> GenResult<bool> {
        let is_self = |ty: &Type| match ty {
            Type::Path(path) => path.qself.is_none() && (path.path.is_ident("Self") || path.path.is_ident(self_ident)),
            _ => false,
        };
        if let ReturnType::Type(_, ty) = &sig.output {
            if is_self(ty) {
                return Ok(false);
            }
            if let Some(ok) = result_ok_type(ty) {
                if is_self(ok) {
                    return Ok(true);
                }
            }
        }
        Err(self.unsupported(
            sig.output.span(),
            "constructors must return `Self` or `Result<Self, E>`",
        ))
    }
}

fn type_ref(ty: &Type) -> TypeRef {
    TypeRef::new(ty.to_token_stream().to_string())
}

fn last_segment(ty: &Type) -> Option<&syn::PathSegment> {
    match ty {
        Type::Path(path) if path.qself.is_none() => path.path.segments.last(),
        Type::Group(group) => last_segment(&group.elem),
        _ => None,
    }
}

fn first_type_arg(segment: &syn::PathSegment) -> Option<&Type> {
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    args.args.iter().find_map(|arg| match arg {
        GenericArgument::Type(ty) => Some(ty),
        _ => None,
    })
}

fn is_value_type(ty: &Type) -> bool {
    last_segment(ty).is_some_and(|segment| segment.ident == "Value" && segment.arguments.is_none())
}

fn vec_of_value(ty: &Type) -> bool {
    last_segment(ty)
        .filter(|segment| segment.ident == "Vec")
        .and_then(first_type_arg)
        .is_some_and(is_value_type)
}

fn result_ok_type(ty: &Type) -> Option<&Type> {
    last_segment(ty)
        .filter(|segment| segment.ident == "Result")
        .and_then(first_type_arg)
}

fn is_unit(ty: &Type) -> bool {
    matches!(ty, Type::Tuple(tuple) if tuple.elems.is_empty())
}

fn returns(output: &ReturnType) -> Returns {
    match output {
        ReturnType::Default => Returns::Unit,
        ReturnType::Type(_, ty) if is_unit(ty) => Returns::Unit,
        ReturnType::Type(_, ty) => match result_ok_type(ty) {
            Some(ok) if is_unit(ok) => Returns::Fallible(None),
            Some(ok) => Returns::Fallible(Some(type_ref(ok))),
            None => Returns::Value(type_ref(ty)),
        },
    }
}

// ============================================================================
// Link
// ============================================================================

/// Join per-file scans into one validated declaration set.
pub fn link<'a>(scans: impl IntoIterator<Item = &'a FileScan>) -> GenResult<DeclarationSet> {
    let mut set = DeclarationSet::default();
    let mut impls: Vec<&ImplScan> = Vec::new();
    let mut type_names: HashMap<String, usize> = HashMap::new();

    for scan in scans {
        for ty in &scan.types {
            if let Some(&first) = type_names.get(&ty.name) {
                return Err(GenError::DuplicateType {
                    name: ty.name.clone(),
                    first: set.types[first].location.clone(),
                    location: ty.location.clone(),
                });
            }
            type_names.insert(ty.name.clone(), set.types.len());
            set.types.push(ty.clone());
        }
        for anchor in &scan.anchors {
            if let Some(first) = &set.anchor {
                return Err(GenError::MultipleAnchors {
                    first: first.location.clone(),
                    second: anchor.location.clone(),
                });
            }
            set.anchor = Some(anchor.clone());
        }
        impls.extend(&scan.impls);
    }

    attach_impls(&mut set, &impls)?;
    for ty in &set.types {
        validate_members(ty)?;
    }
    resolve_bases(&mut set)?;

    debug!(
        types = set.types.len(),
        anchor = set.anchor.as_ref().map(|a| a.ident.as_str()),
        "linked declarations"
    );
    Ok(set)
}

fn attach_impls(set: &mut DeclarationSet, impls: &[&ImplScan]) -> GenResult<()> {
    let by_path: HashMap<(&[String], &str), usize> = set
        .types
        .iter()
        .enumerate()
        .map(|(index, ty)| ((ty.module_path.as_slice(), ty.ident.as_str()), index))
        .collect();
    let targets = impls
        .iter()
        .map(|block| {
            by_path
                .get(&(block.module_path.as_slice(), block.ident.as_str()))
                .copied()
                .ok_or_else(|| GenError::OrphanMethods {
                    ident: block.ident.clone(),
                    module: block.module_path.join("::"),
                    location: block.location.clone(),
                })
        })
        .collect::<GenResult<Vec<_>>>()?;

    for (block, index) in impls.iter().zip(targets) {
        let ty = &mut set.types[index];
        ty.constructors.extend(block.constructors.iter().cloned());
        ty.methods.extend(block.methods.iter().cloned());

        for (name, read_only, kind, accessor) in &block.accessors {
            let position = ty.properties.iter().position(|p| &p.name == name);
            let property = match position {
                Some(position) => &mut ty.properties[position],
                None => {
                    ty.properties.push(AccessorProperty {
                        name: name.clone(),
                        getter: None,
                        setter: None,
                        read_only: false,
                    });
                    let last = ty.properties.len() - 1;
                    &mut ty.properties[last]
                }
            };
            let half = match kind {
                AccessorKind::Getter => &mut property.getter,
                AccessorKind::Setter => &mut property.setter,
            };
            if let Some(first) = half {
                return Err(GenError::DuplicateMember {
                    type_name: ty.name.clone(),
                    member: name.clone(),
                    first: first.location.clone(),
                    location: accessor.location.clone(),
                });
            }
            *half = Some(accessor.clone());
            property.read_only |= *read_only;
        }
    }
    Ok(())
}

fn validate_members(ty: &TypeDescriptor) -> GenResult<()> {
    let mut seen: HashMap<&str, &Location> = HashMap::new();
    let members = ty
        .fields
        .iter()
        .map(|f| (f.name.as_str(), &f.location))
        .chain(
            ty.properties
                .iter()
                .filter_map(|p| p.location().map(|location| (p.name.as_str(), location))),
        )
        .chain(ty.methods.iter().map(|m| (m.name.as_str(), &m.location)));

    for (name, location) in members {
        if let Some(first) = seen.insert(name, location) {
            return Err(GenError::DuplicateMember {
                type_name: ty.name.clone(),
                member: name.to_string(),
                first: first.clone(),
                location: location.clone(),
            });
        }
    }

    for property in &ty.properties {
        if let (Some(getter), Some(setter)) = (&property.getter, &property.setter) {
            if getter.receiver.is_static() != setter.receiver.is_static() {
                return Err(GenError::Unsupported {
                    location: setter.location.clone(),
                    message: format!(
                        "getter and setter of `{}` must both be type-level or both take `self`",
                        property.name
                    ),
                });
            }
        }
    }

    if let Some(second) = ty.constructors.iter().filter(|c| c.is_variadic()).nth(1) {
        return Err(GenError::MultipleVariadicConstructors {
            type_name: ty.name.clone(),
            location: second.location.clone(),
        });
    }
    Ok(())
}

/// Absolute path `base` refers to from `module_path`, when it is spelled with a module prefix
fn absolute_base(module_path: &[String], base: &[String]) -> Option<Vec<String>> {
    let (first, _) = base.split_first()?;
    if base.len() == 1 {
        return None;
    }
    let mut resolved: Vec<String> = match first.as_str() {
        "crate" => Vec::new(),
        _ => module_path.to_vec(),
    };
    for segment in base {
        match segment.as_str() {
            "crate" if resolved.is_empty() => resolved.push(segment.clone()),
            "self" => {}
            "super" => {
                resolved.pop();
            }
            other => resolved.push(other.to_string()),
        }
    }
    Some(resolved)
}

fn resolve_bases(set: &mut DeclarationSet) -> GenResult<()> {
    let full_paths: Vec<Vec<String>> = set
        .types
        .iter()
        .map(|ty| {
            let mut path = ty.module_path.clone();
            path.push(ty.ident.clone());
            path
        })
        .collect();

    for index in 0..set.types.len() {
        let ty = &set.types[index];
        let Some(base) = &ty.base_path else { continue };

        let candidates: Vec<usize> = match absolute_base(&ty.module_path, base) {
            Some(absolute) => full_paths
                .iter()
                .enumerate()
                .filter(|(_, path)| **path == absolute)
                .map(|(i, _)| i)
                .collect(),
            None => {
                let ident = &base[0];
                let local: Vec<usize> = (0..set.types.len())
                    .filter(|&i| set.types[i].ident == *ident && set.types[i].module_path == ty.module_path)
                    .collect();
                if local.is_empty() {
                    (0..set.types.len())
                        .filter(|&i| set.types[i].ident == *ident)
                        .collect()
                } else {
                    local
                }
            }
        };

        let resolved = match candidates.as_slice() {
            [] => {
                debug!(ty = %ty.name, base = %base.join("::"), "base type is not exposed");
                None
            }
            [single] => Some(*single),
            many => {
                return Err(GenError::AmbiguousBase {
                    type_name: ty.name.clone(),
                    base: base.join("::"),
                    candidates: many.iter().map(|&i| set.types[i].rust_path()).collect(),
                    location: ty.location.clone(),
                })
            }
        };
        set.types[index].base = resolved;
    }

    for start in 0..set.types.len() {
        let mut current = set.types[start].base;
        let mut steps = 0;
        while let Some(index) = current {
            if index == start || steps > set.types.len() {
                return Err(GenError::BaseCycle {
                    type_name: set.types[start].name.clone(),
                    location: set.types[start].location.clone(),
                });
            }
            current = set.types[index].base;
            steps += 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::DefaultLiteral;

    fn scan(text: &str) -> GenResult<FileScan> {
        scan_file(&SourceFile::root("src/lib.rs", text))
    }

    #[test]
    fn test_unannotated_declarations_are_skipped() {
        let scan = scan("pub struct Plain { pub x: f32 } impl Plain { pub fn go(&self) {} }").unwrap();
        assert_eq!(scan, FileScan::default());
    }

    #[test]
    fn test_scan_type_with_fields_and_flags() {
        let scan = scan(
            r#"
            #[script_type(name = "Vector3", is_abstract)]
            pub struct Vec3 {
                #[script_property] pub x: f32,
                #[script_property(name = "Y", read_only)] y: f32,
                hidden: u8,
            }
            "#,
        )
        .unwrap();

        let ty = &scan.types[0];
        assert_eq!(ty.name, "Vector3");
        assert_eq!(ty.ident, "Vec3");
        assert!(ty.is_abstract);
        assert!(!ty.is_static);
        assert!(ty.inherit_base_members);
        assert_eq!(ty.fields.len(), 2);
        assert_eq!(ty.fields[1].name, "Y");
        assert_eq!(ty.fields[1].ident, "y");
        assert!(ty.fields[1].read_only);
        assert_eq!(ty.location.line, 3);
    }

    #[test]
    fn test_scan_impl_members() {
        let scan = scan(
            r#"
            #[script_methods]
            impl Mover {
                #[script_constructor]
                pub fn new() -> Self { Mover }
                #[script_method(name = "move")]
                pub fn advance(&mut self, #[script_default(1.0)] distance: f32) {}
                #[script_property]
                pub fn get_speed(&self) -> f64 { 0.0 }
                #[script_property]
                pub fn set_speed(&mut self, value: f64) {}
                #[script_method]
                pub fn label(name: &str) -> Result<String, String> { Ok(name.into()) }
                pub fn not_exposed(&self) {}
            }
            "#,
        )
        .unwrap();

        let block = &scan.impls[0];
        assert_eq!(block.ident, "Mover");
        assert_eq!(block.constructors.len(), 1);
        assert!(!block.constructors[0].fallible);

        let advance = &block.methods[0];
        assert_eq!(advance.name, "move");
        assert_eq!(advance.receiver, Receiver::Mut);
        assert_eq!(
            advance.params[0].kind,
            ParamKind::Optional(Some(DefaultLiteral::Float("1.0".into())))
        );

        let label = &block.methods[1];
        assert_eq!(label.receiver, Receiver::None);
        assert_eq!(label.params[0].ty.text, "String");
        assert_eq!(label.params[0].pass, Pass::Ref);
        assert_eq!(label.returns, Returns::Fallible(Some(TypeRef::new("String"))));

        let names: Vec<_> = block.accessors.iter().map(|(n, _, k, _)| (n.as_str(), *k)).collect();
        assert_eq!(
            names,
            [("speed", AccessorKind::Getter), ("speed", AccessorKind::Setter)]
        );
    }

    #[test]
    fn test_variadic_parameters() {
        let scan = scan(
            r#"
            #[script_methods]
            impl Bag {
                #[script_constructor]
                pub fn from_args(args: &[Value]) -> Self { Bag }
                #[script_method]
                pub fn push_all(&mut self, items: Vec<hostbind_sdk::Value>) {}
            }
            "#,
        )
        .unwrap();
        let block = &scan.impls[0];
        assert!(block.constructors[0].is_variadic());
        assert_eq!(block.methods[0].params[0].kind, ParamKind::Variadic(Variadic::Vec));
    }

    #[test]
    fn test_inline_modules_extend_path() {
        let scan = scan("mod inner { #[script_type] pub struct Node; }").unwrap();
        assert_eq!(scan.types[0].module_path, ["crate", "inner"]);
        assert_eq!(scan.types[0].rust_path(), "crate::inner::Node");
    }

    #[test]
    fn test_unsupported_shapes() {
        let cases = [
            "#[script_type] pub struct G<T> { v: T }",
            "#[script_type] pub struct T(#[script_property] f32);",
            "#[script_methods] impl A { #[script_method] fn f(self) {} }",
            "#[script_methods] impl A { #[script_method] fn f(&self, x: &mut i32) {} }",
            "#[script_methods] impl A { #[script_method] fn f((a, b): (i32, i32)) {} }",
            "#[script_methods] impl A { #[script_constructor] fn new() -> i32 { 0 } }",
            "#[script_methods] impl A { #[script_constructor] fn new(#[script_default] a: &[Value]) -> Self { A } }",
            "#[script_methods] impl A { #[script_method] fn f(#[script_default] a: i32, b: i32) {} }",
            "#[script_methods] impl A { #[script_property] fn f(&self, a: i32, b: i32) {} }",
            "#[script_methods] impl Clone for A { }",
        ];
        for case in cases {
            let err = scan(case).unwrap_err();
            assert!(matches!(err, GenError::Unsupported { .. }), "{case}: {err}");
        }
    }

    #[test]
    fn test_conflicting_member_attributes() {
        let err = scan("#[script_methods] impl A { #[script_method] #[script_property] fn f(&self) -> i32 { 0 } }")
            .unwrap_err();
        assert!(matches!(err, GenError::InvalidAttribute { .. }));
    }

    #[test]
    fn test_parse_error_has_location() {
        let err = scan("#[script_type] pub struct {").unwrap_err();
        assert!(matches!(err, GenError::Parse { .. }));
    }

    fn link_files(files: &[(&str, &str, &str)]) -> GenResult<DeclarationSet> {
        let scans = files
            .iter()
            .map(|(path, module, text)| {
                let module_path = module.split("::").map(str::to_string).collect();
                scan_file(&SourceFile::new(*path, module_path, *text))
            })
            .collect::<GenResult<Vec<_>>>()?;
        link(scans.iter())
    }

    #[test]
    fn test_link_attaches_and_resolves_bases() {
        let set = link_files(&[
            (
                "src/lib.rs",
                "crate",
                "#[script_type(is_abstract)] pub struct Component; #[script_registry] pub struct Builtins;",
            ),
            (
                "src/scene.rs",
                "crate::scene",
                r#"
                #[script_type(base = crate::Component)] pub struct Node;
                #[script_type(base = Node)] pub struct Sprite;
                #[script_type(base = Unexposed)] pub struct Light;
                #[script_methods] impl Node { #[script_method] pub fn name(&self) -> String { String::new() } }
                "#,
            ),
        ])
        .unwrap();

        assert_eq!(set.anchor.as_ref().unwrap().ident, "Builtins");
        assert_eq!(set.base_name(1), Some("Component"));
        assert_eq!(set.base_name(2), Some("Node"));
        assert_eq!(set.base_name(3), None);
        assert_eq!(set.find("Node").unwrap().methods[0].name, "name");
    }

    #[test]
    fn test_link_groups_accessors() {
        let set = link_files(&[(
            "src/lib.rs",
            "crate",
            r#"
            #[script_type] pub struct T;
            #[script_methods] impl T {
                #[script_property(read_only)] pub fn set_level(&mut self, v: i32) {}
                #[script_property] pub fn get_level(&self) -> i32 { 0 }
            }
            "#,
        )])
        .unwrap();
        let property = &set.types[0].properties[0];
        assert_eq!(property.name, "level");
        assert!(property.getter.is_some());
        assert!(property.read_only);
        assert!(!property.is_writable());
    }

    #[test]
    fn test_link_failures() {
        let duplicate_member = link_files(&[(
            "src/lib.rs",
            "crate",
            r#"
            #[script_type] pub struct T { #[script_property] size: i32 }
            #[script_methods] impl T { #[script_method] pub fn size(&self) {} }
            "#,
        )]);
        assert!(matches!(duplicate_member, Err(GenError::DuplicateMember { ref member, .. }) if member == "size"));

        let duplicate_type = link_files(&[
            ("src/a.rs", "crate::a", "#[script_type(name = \"X\")] pub struct A;"),
            ("src/b.rs", "crate::b", "#[script_type(name = \"X\")] pub struct B;"),
        ]);
        assert!(matches!(duplicate_type, Err(GenError::DuplicateType { .. })));

        let anchors = link_files(&[
            ("src/a.rs", "crate::a", "#[script_registry] pub struct A;"),
            ("src/b.rs", "crate::b", "#[script_registry] pub struct B;"),
        ]);
        assert!(matches!(anchors, Err(GenError::MultipleAnchors { .. })));

        let variadic = link_files(&[(
            "src/lib.rs",
            "crate",
            r#"
            #[script_type] pub struct T;
            #[script_methods] impl T {
                #[script_constructor] fn a(args: &[Value]) -> Self { T }
                #[script_constructor] fn b(args: Vec<Value>) -> Self { T }
            }
            "#,
        )]);
        assert!(matches!(variadic, Err(GenError::MultipleVariadicConstructors { .. })));

        let orphan = link_files(&[(
            "src/lib.rs",
            "crate",
            "#[script_methods] impl Missing { #[script_method] fn f(&self) {} }",
        )]);
        assert!(matches!(orphan, Err(GenError::OrphanMethods { .. })));

        let cycle = link_files(&[(
            "src/lib.rs",
            "crate",
            "#[script_type(base = B)] pub struct A; #[script_type(base = A)] pub struct B;",
        )]);
        assert!(matches!(cycle, Err(GenError::BaseCycle { .. })));

        let ambiguous = link_files(&[
            ("src/a.rs", "crate::a", "#[script_type(name = \"A1\")] pub struct Base;"),
            ("src/b.rs", "crate::b", "#[script_type(name = \"B1\")] pub struct Base;"),
            ("src/c.rs", "crate::c", "#[script_type(base = Base)] pub struct Leaf;"),
        ]);
        assert!(matches!(ambiguous, Err(GenError::AmbiguousBase { .. })));
    }

    #[test]
    fn test_discover_uses_cache_and_cancellation() {
        let sources = SourceSet::new(vec![SourceFile::root(
            "src/lib.rs",
            "#[script_type] pub struct T;",
        )]);
        let cache = DiscoveryCache::new();
        let token = CancellationToken::new();

        let first = discover(&sources, Some(&cache), &token).unwrap();
        assert_eq!(cache.len(), 1);
        let second = discover(&sources, Some(&cache), &token).unwrap();
        assert_eq!(first, second);

        token.cancel();
        assert!(discover(&sources, Some(&cache), &token)
            .unwrap_err()
            .is_cancelled());
    }
}
