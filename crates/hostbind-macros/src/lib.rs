// hostbind-macros: annotation attributes for script bindings
//
// The attributes mark what `hostbind-gen` exposes and splice its output
// back into the annotated module:
// - #[script_type]     - exposes a struct, includes its binding table
// - #[script_methods]  - marks an impl block whose fns may be exposed
// - #[script_registry] - marks the anchor, includes the aggregate registry
//
// Member annotations (#[script_constructor], #[script_method],
// #[script_property], #[script_default]) are not macros of their own; the
// container attribute validates and strips them.
//
// Example:
// ```
// use hostbind_sdk::{script_methods, script_registry, script_type};
//
// #[script_type(name = "Vector3")]
// pub struct Vec3 {
//     #[script_property]
//     pub x: f32,
// }
//
// #[script_methods]
// impl Vec3 {
//     #[script_constructor]
//     pub fn new(x: f32) -> Self {
//         Vec3 { x }
//     }
// }
//
// #[script_registry]
// pub struct Builtins;
// ```

use proc_macro::TokenStream;

mod methods;
mod registry;
mod script_type;

/// Exposes a struct to scripts.
///
/// Arguments (all optional):
/// - `name = "Exposed"` - exposed type name, defaults to the struct ident
/// - `is_static` - the type has type-level members only
/// - `is_abstract` - scripts may not instantiate the type
/// - `inherit_base_members = false` - hide the base type's members
/// - `base = path::To::Base` - the exposed base type
///
/// Fields marked `#[script_property]` (optionally `name = ".."`,
/// `read_only`) become properties.
///
/// The struct is emitted unchanged apart from the field annotations, followed
/// by an `include!` of the binding table generated into
/// `$OUT_DIR/hostbind/<Exposed>.rs` by the crate's build script.
///
/// # Example
///
/// ```ignore
/// #[script_type(name = "Vector3")]
/// pub struct Vec3 {
///     #[script_property]
///     pub x: f32,
///     #[script_property(read_only)]
///     pub len: f32,
/// }
/// ```
#[proc_macro_attribute]
pub fn script_type(attr: TokenStream, item: TokenStream) -> TokenStream {
    script_type::expand_script_type(attr.into(), item.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Marks an inherent impl block of a `#[script_type]` struct.
///
/// Inside it:
/// - `#[script_constructor]` on an associated fn returning `Self` or
///   `Result<Self, E>`
/// - `#[script_method]` (optionally `name = ".."`) on any fn
/// - `#[script_property]` on a getter (`fn(&self) -> T`) or setter
///   (`fn(&mut self, T)`); `get_`/`set_` prefixes are dropped from the
///   default name
/// - `#[script_default]` or `#[script_default(literal)]` on trailing
///   parameters to make them optional
///
/// # Example
///
/// ```ignore
/// #[script_methods]
/// impl Vec3 {
///     #[script_method(name = "move")]
///     pub fn translate(&mut self, #[script_default(1.0)] distance: f32) {
///         self.x += distance;
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn script_methods(attr: TokenStream, item: TokenStream) -> TokenStream {
    methods::expand_script_methods(attr.into(), item.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Marks the registry anchor.
///
/// Adds `ENTRIES` and `registry()` to the struct, listing every exposed type
/// of the crate. At most one anchor may exist per crate.
///
/// # Example
///
/// ```ignore
/// #[script_registry]
/// pub struct Builtins;
///
/// let registry = Builtins::registry();
/// ```
#[proc_macro_attribute]
pub fn script_registry(attr: TokenStream, item: TokenStream) -> TokenStream {
    registry::expand_script_registry(attr.into(), item.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// `include!` of a generated file under `$OUT_DIR/hostbind`
fn include_generated(file_name: &str) -> proc_macro2::TokenStream {
    let relative = format!("/{}/{}", hostbind_gen::OUTPUT_SUBDIR, file_name);
    quote::quote! {
        include!(concat!(env!("OUT_DIR"), #relative));
    }
}
