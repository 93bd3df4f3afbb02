//! TypeRegistry — process-wide view over every generated binding table
//!
//! The registry anchor's generated code lists one [`TypeEntry`] per exposed
//! type; [`TypeRegistry::new`] indexes them once. After that the registry is
//! read-only and is the sole entry point from a textual type name to
//! behavior.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::binding::MemberBinding;
use crate::class::{create_erased, BindingResolver, Factory, ScriptClass};
use crate::error::{BindError, BindResult};
use crate::value::{Instance, Value};

/// Registration record of one exposed type
#[derive(Clone, Copy)]
pub struct TypeEntry {
    /// Exposed type name
    pub name: &'static str,
    /// Exposed name of the immediate base type, when that base is exposed
    pub base: Option<&'static str>,
    /// Type-level only
    pub is_static: bool,
    /// Not instantiable
    pub is_abstract: bool,
    /// Base members are visible through this type
    pub inherit_base_members: bool,
    /// Exposed member names in declaration order
    pub member_names: &'static [&'static str],
    /// Constructor dispatch
    pub factory: Factory,
    /// Member dispatch
    pub resolver: BindingResolver,
}

impl TypeEntry {
    /// Build the entry for `T` from its binding table
    pub const fn of<T: ScriptClass>(base: Option<&'static str>) -> Self {
        TypeEntry {
            name: T::CLASS_NAME,
            base,
            is_static: T::IS_STATIC,
            is_abstract: T::IS_ABSTRACT,
            inherit_base_members: T::INHERIT_BASE_MEMBERS,
            member_names: T::MEMBER_NAMES,
            factory: create_erased::<T>,
            resolver: T::create_member_binding,
        }
    }
}

impl std::fmt::Debug for TypeEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeEntry")
            .field("name", &self.name)
            .field("base", &self.base)
            .field("is_static", &self.is_static)
            .field("is_abstract", &self.is_abstract)
            .finish()
    }
}

/// Name-keyed index over all registered types.
pub struct TypeRegistry {
    entries: Vec<TypeEntry>,
    by_name: FxHashMap<&'static str, usize>,
    base_type_names: FxHashMap<&'static str, &'static str>,
    member_names: FxHashMap<&'static str, FxHashSet<&'static str>>,
    static_type_names: FxHashSet<&'static str>,
    abstract_type_names: FxHashSet<&'static str>,
}

impl TypeRegistry {
    /// Index `entries`.
    ///
    /// Generated entry lists never repeat a name; if a hand-built list does,
    /// the first entry wins.
    pub fn new(entries: &[TypeEntry]) -> Self {
        let mut registry = TypeRegistry {
            entries: Vec::with_capacity(entries.len()),
            by_name: FxHashMap::default(),
            base_type_names: FxHashMap::default(),
            member_names: FxHashMap::default(),
            static_type_names: FxHashSet::default(),
            abstract_type_names: FxHashSet::default(),
        };

        for entry in entries {
            if registry.by_name.contains_key(entry.name) {
                continue;
            }
            registry.by_name.insert(entry.name, registry.entries.len());
            registry.entries.push(*entry);

            if let Some(base) = entry.base {
                registry.base_type_names.insert(entry.name, base);
            }
            registry
                .member_names
                .insert(entry.name, entry.member_names.iter().copied().collect());
            if entry.is_static {
                registry.static_type_names.insert(entry.name);
            }
            if entry.is_abstract {
                registry.abstract_type_names.insert(entry.name);
            }
        }

        registry
    }

    fn entry(&self, type_name: &str) -> BindResult<&TypeEntry> {
        self.by_name
            .get(type_name)
            .map(|&index| &self.entries[index])
            .ok_or_else(|| BindError::UnknownType(type_name.to_string()))
    }

    /// Exposed type names in registration order
    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|e| e.name)
    }

    /// Check if a type is registered
    pub fn contains_type(&self, type_name: &str) -> bool {
        self.by_name.contains_key(type_name)
    }

    /// Get number of registered types
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exposed base type of `type_name`, if the immediate base is exposed
    pub fn base_type_name(&self, type_name: &str) -> Option<&'static str> {
        self.base_type_names.get(type_name).copied()
    }

    /// Type name → exposed base type name
    pub fn base_type_names(&self) -> &FxHashMap<&'static str, &'static str> {
        &self.base_type_names
    }

    /// Member-name set of `type_name`
    pub fn member_names(&self, type_name: &str) -> Option<&FxHashSet<&'static str>> {
        self.member_names.get(type_name)
    }

    /// Static type names
    pub fn static_type_names(&self) -> &FxHashSet<&'static str> {
        &self.static_type_names
    }

    /// Abstract type names
    pub fn abstract_type_names(&self) -> &FxHashSet<&'static str> {
        &self.abstract_type_names
    }

    /// Check if `type_name` is a static type
    pub fn is_static_type(&self, type_name: &str) -> bool {
        self.static_type_names.contains(type_name)
    }

    /// Check if `type_name` is an abstract type
    pub fn is_abstract_type(&self, type_name: &str) -> bool {
        self.abstract_type_names.contains(type_name)
    }

    /// Registration record of `type_name`
    pub fn type_entry(&self, type_name: &str) -> BindResult<&TypeEntry> {
        self.entry(type_name)
    }

    /// Construct an instance of `type_name` from `args`
    pub fn create_instance(&self, type_name: &str, args: &[Value]) -> BindResult<Instance> {
        (self.entry(type_name)?.factory)(args)
    }

    /// Factory bound to `type_name`, for repeated-construction call sites
    pub fn create_factory(&self, type_name: &str) -> BindResult<Factory> {
        Ok(self.entry(type_name)?.factory)
    }

    /// Resolve `member_name` on `type_name`
    pub fn create_binding(&self, type_name: &str, member_name: &str) -> BindResult<MemberBinding> {
        (self.entry(type_name)?.resolver)(member_name)
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.entries)
            .finish()
    }
}
