//! Module arena and per-module binding tables.
//!
//! # Ownership
//!
//! Modules live in one arena and refer to each other by [`ModuleId`]. A
//! module's parent is a handle, never an owning pointer; the root is its own
//! parent.
//!
//! # Binding resolution
//!
//! Each module maps names to local [`Binding`] entries. An entry whose owner is
//! another module is an import: reading it follows the owner's entry, the value
//! is never copied. An entry with no owner is a placeholder created by
//! `export` before the name was assigned or imported.
//!
//! Names not found locally are searched in the exported bindings of the
//! modules brought in with `using`; a hit is cached as an implicit import
//! entry, after which the name counts as resolved.

use bitflags::bitflags;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use weft_ir::Name;

use crate::value::Value;

/// Handle to a module in the [`ModuleStore`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub u32);

bitflags! {
    /// Per-binding flags.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct BindingFlags: u8 {
        /// Value may be set at most once.
        const CONST = 1 << 0;
        /// Visible to `using` and `importall`.
        const EXPORTED = 1 << 1;
        /// Brought in by an explicit `import`.
        const IMPORTED = 1 << 2;
    }
}

/// A named storage location inside a module.
#[derive(Clone, Debug)]
pub struct Binding {
    pub name: Name,
    /// Owning module; `None` for an unresolved placeholder.
    pub owner: Option<ModuleId>,
    /// Only meaningful when the entry is owned by the module holding it.
    pub value: Option<Value>,
    pub flags: BindingFlags,
}

impl Binding {
    fn placeholder(name: Name) -> Self {
        Binding {
            name,
            owner: None,
            value: None,
            flags: BindingFlags::empty(),
        }
    }

    #[inline]
    pub fn is_const(&self) -> bool {
        self.flags.contains(BindingFlags::CONST)
    }

    #[inline]
    pub fn is_exported(&self) -> bool {
        self.flags.contains(BindingFlags::EXPORTED)
    }

    #[inline]
    pub fn is_imported(&self) -> bool {
        self.flags.contains(BindingFlags::IMPORTED)
    }
}

/// A namespace with a parent link, a binding table, and its `using` list.
#[derive(Debug)]
pub struct Module {
    pub name: Name,
    pub parent: ModuleId,
    bindings: FxHashMap<Name, Binding>,
    usings: Vec<ModuleId>,
}

impl Module {
    /// Local entry for `name`, without following imports or `using`.
    pub fn entry(&self, name: Name) -> Option<&Binding> {
        self.bindings.get(&name)
    }

    /// Names exported by this module, in no particular order.
    pub fn exported_names(&self) -> impl Iterator<Item = Name> + '_ {
        self.bindings
            .values()
            .filter(|b| b.is_exported())
            .map(|b| b.name)
    }

    /// Modules brought in with `using`, in the order they were added.
    pub fn usings(&self) -> &[ModuleId] {
        &self.usings
    }
}

/// Why a write to a binding was refused.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WriteError {
    /// The entry is an import from the given module.
    Imported { owner: ModuleId },
    /// The entry is constant and already holds a value.
    Constant,
}

/// Outcome of importing one name.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ImportOutcome {
    /// A new entry or a refreshed flag.
    Imported,
    /// The source module has no binding with that name.
    Missing,
    /// The target already owns a defined binding, or imports the name from
    /// elsewhere.
    Conflict,
}

/// Arena of all modules.
#[derive(Debug, Default)]
pub struct ModuleStore {
    modules: Vec<Module>,
}

impl ModuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a module. `parent = None` makes the module its own parent.
    ///
    /// The new module binds its own name to itself as a constant.
    pub fn create(&mut self, name: Name, parent: Option<ModuleId>) -> ModuleId {
        let raw = u32::try_from(self.modules.len()).unwrap_or(u32::MAX);
        let id = ModuleId(raw);
        let mut bindings = FxHashMap::default();
        bindings.insert(
            name,
            Binding {
                name,
                owner: Some(id),
                value: Some(Value::Module(id)),
                flags: BindingFlags::CONST,
            },
        );
        self.modules.push(Module {
            name,
            parent: parent.unwrap_or(id),
            bindings,
            usings: Vec::new(),
        });
        id
    }

    /// Access a module.
    ///
    /// # Panics
    /// Panics on a handle from another store.
    #[inline]
    pub fn get(&self, id: ModuleId) -> &Module {
        &self.modules[id.0 as usize]
    }

    #[inline]
    fn get_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    #[inline]
    pub fn parent(&self, id: ModuleId) -> ModuleId {
        self.get(id).parent
    }

    #[inline]
    pub fn name(&self, id: ModuleId) -> Name {
        self.get(id).name
    }

    /// Re-link a module's parent. Only bootstrap code does this.
    pub fn set_parent(&mut self, id: ModuleId, parent: ModuleId) {
        self.get_mut(id).parent = parent;
    }

    /// Whether `name` has a local entry with a known owner.
    pub fn is_resolved(&self, m: ModuleId, name: Name) -> bool {
        self.get(m)
            .entry(name)
            .is_some_and(|b| b.owner.is_some())
    }

    /// Get-or-create an entry owned by `m`, ready to be written.
    pub fn binding_for_write(
        &mut self,
        m: ModuleId,
        name: Name,
    ) -> Result<&mut Binding, WriteError> {
        let module = self.get_mut(m);
        let entry = module
            .bindings
            .entry(name)
            .or_insert_with(|| Binding::placeholder(name));
        match entry.owner {
            None => {
                entry.owner = Some(m);
                Ok(entry)
            }
            Some(owner) if owner == m => Ok(entry),
            Some(owner) => Err(WriteError::Imported { owner }),
        }
    }

    /// Find the module that owns the binding `name` resolves to from `m`.
    ///
    /// Follows import entries to their owner and searches `using` lists,
    /// caching hits as implicit imports. A module already on the search path
    /// counts as not found, so cyclic `using` lists terminate.
    pub fn resolve(&mut self, m: ModuleId, name: Name) -> Option<ModuleId> {
        let mut path = SmallVec::new();
        self.resolve_on_path(m, name, &mut path)
    }

    fn resolve_on_path(
        &mut self,
        m: ModuleId,
        name: Name,
        path: &mut SmallVec<[ModuleId; 8]>,
    ) -> Option<ModuleId> {
        if let Some(owner) = self.get(m).entry(name).and_then(|b| b.owner) {
            return Some(self.true_owner(owner, name));
        }
        if path.contains(&m) {
            return None;
        }

        path.push(m);
        let usings = self.get(m).usings.clone();
        let found = usings.into_iter().find_map(|u| {
            let exported = self.get(u).entry(name).is_some_and(Binding::is_exported);
            if exported {
                self.resolve_on_path(u, name, path)
            } else {
                None
            }
        });
        path.pop();
        let found = found?;

        let entry = self
            .get_mut(m)
            .bindings
            .entry(name)
            .or_insert_with(|| Binding::placeholder(name));
        entry.owner = Some(found);
        Some(found)
    }

    /// Chase import entries until reaching the module that owns the value.
    fn true_owner(&self, mut owner: ModuleId, name: Name) -> ModuleId {
        // Import chains are acyclic: an entry only ever points at a module
        // that already resolved the name.
        for _ in 0..self.modules.len() {
            match self.get(owner).entry(name).and_then(|b| b.owner) {
                Some(next) if next != owner => owner = next,
                _ => break,
            }
        }
        owner
    }

    /// The effective binding for `name` as seen from `m`, without caching a
    /// hit found through `using`.
    pub fn peek(&self, m: ModuleId, name: Name) -> Option<&Binding> {
        let owner = match self.get(m).entry(name).and_then(|b| b.owner) {
            Some(owner) => self.true_owner(owner, name),
            None => self.get(m).usings.iter().find_map(|&u| {
                self.get(u)
                    .entry(name)
                    .filter(|b| b.is_exported())
                    .and_then(|b| b.owner)
                    .map(|owner| self.true_owner(owner, name))
            })?,
        };
        self.get(owner).entry(name)
    }

    /// The effective binding for `name` as seen from `m`.
    pub fn binding(&mut self, m: ModuleId, name: Name) -> Option<&Binding> {
        let owner = self.resolve(m, name)?;
        self.get(owner).entry(name)
    }

    /// Current value of a global, following imports.
    pub fn global(&mut self, m: ModuleId, name: Name) -> Option<Value> {
        self.binding(m, name).and_then(|b| b.value.clone())
    }

    /// Set a non-constant global, or a constant that has no value yet.
    pub fn set_global(&mut self, m: ModuleId, name: Name, value: Value) -> Result<(), WriteError> {
        let binding = self.binding_for_write(m, name)?;
        if binding.is_const() && binding.value.is_some() {
            return Err(WriteError::Constant);
        }
        binding.value = Some(value);
        Ok(())
    }

    /// Define a constant. Fails if the binding already has a value.
    pub fn set_const(&mut self, m: ModuleId, name: Name, value: Value) -> Result<(), WriteError> {
        let binding = self.binding_for_write(m, name)?;
        if binding.value.is_some() {
            return Err(WriteError::Constant);
        }
        binding.value = Some(value);
        binding.flags |= BindingFlags::CONST;
        Ok(())
    }

    /// Bind a constant, overwriting any previous value.
    ///
    /// Returns the value that was replaced.
    pub fn replace_const(
        &mut self,
        m: ModuleId,
        name: Name,
        value: Value,
    ) -> Result<Option<Value>, WriteError> {
        let binding = self.binding_for_write(m, name)?;
        binding.flags |= BindingFlags::CONST;
        Ok(binding.value.replace(value))
    }

    /// Mark an owned binding constant.
    pub fn mark_constant(&mut self, m: ModuleId, name: Name) -> Result<(), WriteError> {
        self.binding_for_write(m, name)?.flags |= BindingFlags::CONST;
        Ok(())
    }

    /// Mark `name` exported from `m`, creating a placeholder if needed.
    pub fn export(&mut self, m: ModuleId, name: Name) {
        self.get_mut(m)
            .bindings
            .entry(name)
            .or_insert_with(|| Binding::placeholder(name))
            .flags |= BindingFlags::EXPORTED;
    }

    /// Import `name` from `from` into `to`.
    ///
    /// `explicit` marks the entry `IMPORTED` (an `import` statement rather
    /// than a single-name `using`).
    pub fn import(&mut self, to: ModuleId, from: ModuleId, name: Name, explicit: bool) -> ImportOutcome {
        let Some(owner) = self.resolve(from, name) else {
            return ImportOutcome::Missing;
        };
        let flag = if explicit {
            BindingFlags::IMPORTED
        } else {
            BindingFlags::empty()
        };

        let target = self.get_mut(to);
        match target.bindings.get_mut(&name) {
            Some(existing) => match existing.owner {
                Some(o) if o == owner => {
                    existing.flags |= flag;
                    ImportOutcome::Imported
                }
                Some(o) if o == to && existing.value.is_none() => {
                    existing.owner = Some(owner);
                    existing.flags |= flag;
                    ImportOutcome::Imported
                }
                None => {
                    existing.owner = Some(owner);
                    existing.flags |= flag;
                    ImportOutcome::Imported
                }
                Some(_) => ImportOutcome::Conflict,
            },
            None => {
                target.bindings.insert(
                    name,
                    Binding {
                        name,
                        owner: Some(owner),
                        value: None,
                        flags: flag,
                    },
                );
                ImportOutcome::Imported
            }
        }
    }

    /// Add `from` to the `using` list of `to`.
    pub fn using(&mut self, to: ModuleId, from: ModuleId) {
        if to == from {
            return;
        }
        let usings = &mut self.get_mut(to).usings;
        if !usings.contains(&from) {
            usings.push(from);
        }
    }

    /// Explicitly import every exported name of `from` into `to`.
    ///
    /// Returns the names that could not be imported with their outcome.
    pub fn import_all(&mut self, to: ModuleId, from: ModuleId) -> Vec<(Name, ImportOutcome)> {
        let mut names: Vec<Name> = self.get(from).exported_names().collect();
        names.sort();
        names
            .into_iter()
            .filter_map(|name| match self.import(to, from, name, true) {
                ImportOutcome::Imported => None,
                other => Some((name, other)),
            })
            .collect()
    }
}
