//! Binding table synthesizer
//!
//! Emits, per exposed type, the `impl ScriptClass` that the interpreter
//! dispatches through, a hidden inherent impl with one fn per binding, and
//! an `impl IntoValue` so host methods can hand instances back to scripts.
//!
//! The output is included into the module that declares the type, so it
//! names the type, its fields and its member fns exactly as written there.

use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};
use tracing::debug;

use crate::error::GenResult;
use crate::model::{
    Accessor, AccessorProperty, ConstructorDescriptor, FieldProperty, MethodDescriptor, Pass,
    Receiver, Returns, TypeDescriptor,
};
use crate::params::{bind_parameters, constructor_plan, parse_type};

/// Header written at the top of every generated file
pub const GENERATED_HEADER: &str = "// @generated by hostbind-gen. Do not edit.\n";

/// Generated binding table of one type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeArtifact {
    /// Exposed type name
    pub type_name: String,
    /// Rust path of the type
    pub rust_path: String,
    /// File name under the output directory
    pub file_name: String,
    /// Rust source
    pub code: String,
}

/// File name of the binding table of the exposed type `type_name`
pub fn artifact_file_name(type_name: &str) -> String {
    format!("{}.rs", type_name)
}

/// Synthesize the binding table of `ty`.
pub fn synthesize(ty: &TypeDescriptor) -> GenResult<TypeArtifact> {
    let tokens = binding_table(ty)?;
    debug!(ty = %ty.name, rust_path = %ty.rust_path(), "synthesized binding table");
    Ok(TypeArtifact {
        type_name: ty.name.clone(),
        rust_path: ty.rust_path(),
        file_name: artifact_file_name(&ty.name),
        code: format!("{}{}\n", GENERATED_HEADER, tokens),
    })
}

/// Tokens of the binding table of `ty`
pub fn binding_table(ty: &TypeDescriptor) -> GenResult<TokenStream> {
    let self_ident = format_ident!("{}", ty.ident);
    let class_name = &ty.name;
    let is_static = ty.is_static;
    let is_abstract = ty.is_abstract;
    let inherit = ty.inherit_base_members;
    let member_names: Vec<&str> = ty.member_names().collect();

    let mut helpers = Vec::new();
    let mut arms = Vec::new();

    for (index, field) in ty.fields.iter().enumerate() {
        let (helper, arm) = field_binding(index, field)?;
        helpers.push(helper);
        arms.push(arm);
    }
    let offset = ty.fields.len();
    for (index, property) in ty.properties.iter().enumerate() {
        let (helper, arm) = accessor_binding(offset + index, property)?;
        helpers.push(helper);
        arms.push(arm);
    }
    for (index, method) in ty.methods.iter().enumerate() {
        let (helper, arm) = method_binding(index, method)?;
        helpers.push(helper);
        arms.push(arm);
    }

    let create_instance = create_instance(ty)?;

    Ok(quote! {
        #[automatically_derived]
        #[allow(unused_variables, unused_mut, clippy::all)]
        impl ::hostbind_sdk::ScriptClass for #self_ident {
            const CLASS_NAME: &'static str = #class_name;
            const IS_STATIC: bool = #is_static;
            const IS_ABSTRACT: bool = #is_abstract;
            const INHERIT_BASE_MEMBERS: bool = #inherit;
            const MEMBER_NAMES: &'static [&'static str] = &[#(#member_names),*];

            fn create_instance(
                __args: &[::hostbind_sdk::Value],
            ) -> ::hostbind_sdk::BindResult<Self> {
                #create_instance
            }

            fn create_member_binding(
                __name: &str,
            ) -> ::hostbind_sdk::BindResult<::hostbind_sdk::MemberBinding> {
                match __name {
                    #(#arms)*
                    _ => ::core::result::Result::Err(
                        ::hostbind_sdk::BindError::binding_not_found(__name, Self::CLASS_NAME),
                    ),
                }
            }
        }

        #[doc(hidden)]
        #[allow(unused_variables, unused_mut, non_snake_case, clippy::all)]
        impl #self_ident {
            #(#helpers)*
        }

        #[automatically_derived]
        impl ::hostbind_sdk::IntoValue for #self_ident {
            fn into_value(self) -> ::hostbind_sdk::Value {
                ::hostbind_sdk::Value::Object(::hostbind_sdk::Instance::new(
                    <Self as ::hostbind_sdk::ScriptClass>::CLASS_NAME,
                    self,
                ))
            }
        }
    })
}

// ============================================================================
// Constructors
// ============================================================================

fn create_instance(ty: &TypeDescriptor) -> GenResult<TokenStream> {
    let plan = constructor_plan(ty);
    let mut body = TokenStream::new();

    for ctor in &plan.exact {
        let arity = ctor.arity();
        let call = constructor_call(ty, ctor)?;
        body.extend(quote! {
            if __args.len() == #arity {
                #call
            }
        });
    }

    match plan.fallback {
        Some(ctor) => body.extend(constructor_call(ty, ctor)?),
        None => body.extend(quote! {
            ::core::result::Result::Err(::hostbind_sdk::BindError::Arity {
                type_name: Self::CLASS_NAME,
                count: __args.len(),
            })
        }),
    }
    Ok(body)
}

/// Bind and call one constructor; always returns
fn constructor_call(ty: &TypeDescriptor, ctor: &ConstructorDescriptor) -> GenResult<TokenStream> {
    let ident = format_ident!("{}", ctor.ident);
    let bound = bind_parameters(&ctor.params, &ty.name, &ctor.location)?;
    let prelude = &bound.prelude;
    let args = &bound.args;
    let member = &ty.name;

    let result = if ctor.fallible {
        quote! {
            ::core::result::Result::map_err(Self::#ident(#(#args),*), |__error| {
                ::hostbind_sdk::BindError::invocation(#member, __error)
            })
        }
    } else {
        quote!(::core::result::Result::Ok(Self::#ident(#(#args),*)))
    };

    Ok(quote! {
        #prelude
        return #result;
    })
}

// ============================================================================
// Properties
// ============================================================================

fn getter_ident(index: usize) -> Ident {
    format_ident!("__hostbind_prop{}_get", index)
}

fn setter_ident(index: usize) -> Ident {
    format_ident!("__hostbind_prop{}_set", index)
}

fn property_arm(name: &str, getter: Option<&Ident>, setter: Option<&Ident>) -> TokenStream {
    let getter = match getter {
        Some(ident) => quote!(::core::option::Option::Some(Self::#ident)),
        None => quote!(::core::option::Option::None),
    };
    let setter = match setter {
        Some(ident) => quote!(::core::option::Option::Some(Self::#ident)),
        None => quote!(::core::option::Option::None),
    };
    quote! {
        #name => ::core::result::Result::Ok(::hostbind_sdk::MemberBinding::Property(
            ::hostbind_sdk::PropertyBinding::new(#name, Self::CLASS_NAME, #getter, #setter),
        )),
    }
}

fn field_binding(index: usize, field: &FieldProperty) -> GenResult<(TokenStream, TokenStream)> {
    let field_ident = format_ident!("{}", field.ident);
    let ty = parse_type(&field.ty, &field.location)?;
    let get = getter_ident(index);
    let set = setter_ident(index);

    let mut helper = quote! {
        fn #get(
            __instance: ::core::option::Option<&::hostbind_sdk::Instance>,
        ) -> ::hostbind_sdk::BindResult<::hostbind_sdk::Value> {
            ::hostbind_sdk::with_receiver::<Self, _>(__instance, |__this| {
                ::hostbind_sdk::IntoValue::into_value(::core::clone::Clone::clone(&__this.#field_ident))
            })
        }
    };
    if !field.read_only {
        helper.extend(quote! {
            fn #set(
                __instance: ::core::option::Option<&::hostbind_sdk::Instance>,
                __value: &::hostbind_sdk::Value,
            ) -> ::hostbind_sdk::BindResult<()> {
                let __value: #ty = ::hostbind_sdk::convert_to::<#ty>(__value)?;
                ::hostbind_sdk::with_receiver_mut::<Self, _>(__instance, move |__this| {
                    __this.#field_ident = __value;
                })
            }
        });
    }

    let arm = property_arm(&field.name, Some(&get), (!field.read_only).then_some(&set));
    Ok((helper, arm))
}

fn accessor_binding(index: usize, property: &AccessorProperty) -> GenResult<(TokenStream, TokenStream)> {
    let get = getter_ident(index);
    let set = setter_ident(index);
    let mut helper = TokenStream::new();

    if let Some(getter) = &property.getter {
        helper.extend(accessor_getter(&get, getter));
    }
    let writable = match &property.setter {
        Some(setter) if !property.read_only => {
            helper.extend(accessor_setter(&set, setter)?);
            true
        }
        _ => false,
    };

    let arm = property_arm(
        &property.name,
        property.getter.as_ref().map(|_| &get),
        writable.then_some(&set),
    );
    Ok((helper, arm))
}

fn receiver_call(receiver: Receiver, call: TokenStream) -> TokenStream {
    match receiver {
        Receiver::None => quote!(#call),
        Receiver::Ref => quote! {
            ::hostbind_sdk::with_receiver::<Self, _>(__instance, move |__this| #call)?
        },
        Receiver::Mut => quote! {
            ::hostbind_sdk::with_receiver_mut::<Self, _>(__instance, move |__this| #call)?
        },
    }
}

fn callee(receiver: Receiver, ident: &Ident) -> TokenStream {
    match receiver {
        Receiver::None => quote!(Self::#ident),
        Receiver::Ref | Receiver::Mut => quote!(__this.#ident),
    }
}

fn accessor_getter(helper: &Ident, getter: &Accessor) -> TokenStream {
    let ident = format_ident!("{}", getter.ident);
    let callee = callee(getter.receiver, &ident);
    let read = receiver_call(
        getter.receiver,
        quote!(::hostbind_sdk::IntoValue::into_value(#callee())),
    );
    quote! {
        fn #helper(
            __instance: ::core::option::Option<&::hostbind_sdk::Instance>,
        ) -> ::hostbind_sdk::BindResult<::hostbind_sdk::Value> {
            ::core::result::Result::Ok(#read)
        }
    }
}

fn accessor_setter(helper: &Ident, setter: &Accessor) -> GenResult<TokenStream> {
    let ident = format_ident!("{}", setter.ident);
    let ty = parse_type(&setter.ty, &setter.location)?;
    let callee = callee(setter.receiver, &ident);
    let value = match setter.pass {
        Pass::Owned => quote!(__value),
        Pass::Ref => quote!(&__value),
    };
    let write = receiver_call(setter.receiver, quote!(#callee(#value)));
    Ok(quote! {
        fn #helper(
            __instance: ::core::option::Option<&::hostbind_sdk::Instance>,
            __value: &::hostbind_sdk::Value,
        ) -> ::hostbind_sdk::BindResult<()> {
            let __value: #ty = ::hostbind_sdk::convert_to::<#ty>(__value)?;
            #write;
            ::core::result::Result::Ok(())
        }
    })
}

// ============================================================================
// Methods
// ============================================================================

fn method_binding(index: usize, method: &MethodDescriptor) -> GenResult<(TokenStream, TokenStream)> {
    let helper_ident = format_ident!("__hostbind_method{}", index);
    let ident = format_ident!("{}", method.ident);
    let name = &method.name;
    let bound = bind_parameters(&method.params, &method.name, &method.location)?;
    let prelude = &bound.prelude;
    let args = &bound.args;

    let callee = callee(method.receiver, &ident);
    let call = quote!(#callee(#(#args),*));
    let (inner, finish) = method_result(&method.returns, name, call);
    let result = receiver_call(method.receiver, inner);

    let helper = quote! {
        fn #helper_ident(
            __instance: ::core::option::Option<&::hostbind_sdk::Instance>,
            __args: &[::hostbind_sdk::Value],
        ) -> ::hostbind_sdk::BindResult<::core::option::Option<::hostbind_sdk::Value>> {
            #prelude
            let __result = #result;
            #finish
        }
    };
    let arm = quote! {
        #name => ::core::result::Result::Ok(::hostbind_sdk::MemberBinding::Method(
            ::hostbind_sdk::MethodBinding::new(#name, Self::#helper_ident),
        )),
    };
    Ok((helper, arm))
}

/// Expression evaluated with the receiver borrowed, and the tail producing
/// the binding's result from `__result`.
///
/// Return values are converted while the receiver is still borrowed, so
/// methods may return data borrowed from `self`.
fn method_result(
    returns: &Returns,
    name: &str,
    call: TokenStream,
) -> (TokenStream, TokenStream) {
    let invocation_error = quote! {
        |__error| ::hostbind_sdk::BindError::invocation(#name, __error)
    };
    match returns {
        Returns::Unit => (
            call,
            quote! {
                let () = __result;
                ::core::result::Result::Ok(::core::option::Option::None)
            },
        ),
        Returns::Value(_) => (
            quote!(::hostbind_sdk::IntoValue::into_value(#call)),
            quote!(::core::result::Result::Ok(::core::option::Option::Some(__result))),
        ),
        Returns::Fallible(None) => (
            call,
            quote! {
                ::core::result::Result::map_err(__result, #invocation_error)?;
                ::core::result::Result::Ok(::core::option::Option::None)
            },
        ),
        Returns::Fallible(Some(_)) => (
            quote!(::core::result::Result::map(#call, ::hostbind_sdk::IntoValue::into_value)),
            quote! {
                let __value = ::core::result::Result::map_err(__result, #invocation_error)?;
                ::core::result::Result::Ok(::core::option::Option::Some(__value))
            },
        ),
    }
}
