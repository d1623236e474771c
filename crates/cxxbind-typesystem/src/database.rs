use std::collections::HashMap;

use smol_str::SmolStr;

use crate::entry::{SnakeCasePolicy, TypeEntry, TypeEntryId, TypeEntryKind};
use crate::modifications::{FieldModification, FunctionModification};

/// Accumulates type entries and rules before freezing.
///
/// The builder pipeline only ever sees the frozen [`TypeDatabase`].
pub struct TypeDatabaseBuilder {
    entries: Vec<TypeEntry>,
    function_mods: HashMap<SmolStr, Vec<FunctionModification>>,
    field_mods: HashMap<SmolStr, Vec<FieldModification>>,
}

impl TypeDatabaseBuilder {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            function_mods: HashMap::new(),
            field_mods: HashMap::new(),
        }
    }

    pub fn push(&mut self, entry: TypeEntry) -> TypeEntryId {
        let id = TypeEntryId(self.entries.len() as u32);
        self.entries.push(entry);
        id
    }

    /// Look up an already-pushed entry by qualified name. Lets rule
    /// construction reference earlier entries (flags over an enum,
    /// typedef targets) without threading ids around.
    pub fn find(&self, qualified_name: &str) -> Option<TypeEntryId> {
        self.entries
            .iter()
            .position(|e| e.qualified_name == qualified_name)
            .map(|i| TypeEntryId(i as u32))
    }

    /// Attach a function rule to a class (or to the empty string for
    /// global functions).
    pub fn add_function_modification(&mut self, owner: &str, m: FunctionModification) {
        self.function_mods.entry(SmolStr::new(owner)).or_default().push(m);
    }

    pub fn add_field_modification(&mut self, owner: &str, m: FieldModification) {
        self.field_mods.entry(SmolStr::new(owner)).or_default().push(m);
    }

    pub fn freeze(self) -> TypeDatabase {
        let mut by_qualified = HashMap::with_capacity(self.entries.len());
        let mut by_name: HashMap<SmolStr, Vec<TypeEntryId>> = HashMap::new();
        let mut flags_for_enum = HashMap::new();
        for (i, entry) in self.entries.iter().enumerate() {
            let id = TypeEntryId(i as u32);
            by_qualified.insert(entry.qualified_name.clone(), id);
            by_name.entry(SmolStr::new(entry.name())).or_default().push(id);
            if let TypeEntryKind::Flags { underlying } = entry.kind {
                flags_for_enum.insert(underlying, id);
            }
        }
        TypeDatabase {
            entries: self.entries.into_boxed_slice(),
            by_qualified,
            by_name,
            flags_for_enum,
            function_mods: self.function_mods,
            field_mods: self.field_mods,
        }
    }
}

impl Default for TypeDatabaseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The frozen type-system rule table.
///
/// Read-only for the whole build run: lookups by qualified or
/// unqualified name, modification retrieval, and entry iteration for
/// the snippet-scanning pass.
#[derive(Debug, Clone)]
pub struct TypeDatabase {
    entries: Box<[TypeEntry]>,
    by_qualified: HashMap<SmolStr, TypeEntryId>,
    by_name: HashMap<SmolStr, Vec<TypeEntryId>>,
    flags_for_enum: HashMap<TypeEntryId, TypeEntryId>,
    function_mods: HashMap<SmolStr, Vec<FunctionModification>>,
    field_mods: HashMap<SmolStr, Vec<FieldModification>>,
}

impl TypeDatabase {
    pub fn entry(&self, id: TypeEntryId) -> &TypeEntry {
        &self.entries[id.index()]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeEntryId, &TypeEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| (TypeEntryId(i as u32), e))
    }

    /// Exact qualified-name lookup.
    pub fn find_type(&self, qualified_name: &str) -> Option<TypeEntryId> {
        self.by_qualified.get(qualified_name).copied()
    }

    /// All entries sharing an unqualified name, in insertion order.
    ///
    /// More than one candidate for a name looked up without scope
    /// context is an ambiguity the resolver reports.
    pub fn candidates(&self, name: &str) -> &[TypeEntryId] {
        self.by_name.get(name).map_or(&[], Vec::as_slice)
    }

    /// The flags entry wrapping an enum entry, if the rules declare one.
    pub fn flags_entry_for_enum(&self, enum_entry: TypeEntryId) -> Option<TypeEntryId> {
        self.flags_for_enum.get(&enum_entry).copied()
    }

    /// Resolve typedef chains to the terminal entry.
    ///
    /// Cycles cannot be built through `TypeDatabaseBuilder::push`
    /// (a typedef can only point at an already-pushed entry), so the
    /// chase terminates.
    pub fn resolve_typedefs(&self, mut id: TypeEntryId) -> TypeEntryId {
        while let TypeEntryKind::Typedef { target } = self.entry(id).kind {
            id = target;
        }
        id
    }

    /// Function rules of `owner` that match `minimal_signature`.
    pub fn function_modifications(
        &self,
        owner: &str,
        minimal_signature: &str,
    ) -> Vec<&FunctionModification> {
        self.function_mods
            .get(owner)
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .filter(|m| m.matches(minimal_signature))
            .collect()
    }

    /// All function rules of `owner`, matched or not. Used to warn
    /// about rules that matched nothing.
    pub fn all_function_modifications(&self, owner: &str) -> &[FunctionModification] {
        self.function_mods.get(owner).map_or(&[], Vec::as_slice)
    }

    pub fn field_modifications(&self, owner: &str, field: &str) -> Vec<&FieldModification> {
        self.field_mods
            .get(owner)
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .filter(|m| m.name == field)
            .collect()
    }

    /// Naming policy for a type's generated members; defaults to the
    /// original spelling for unknown names.
    pub fn snake_case_policy(&self, qualified_name: &str) -> SnakeCasePolicy {
        self.find_type(qualified_name)
            .map_or_else(SnakeCasePolicy::default, |id| self.entry(id).snake_case)
    }

    /// Is this name explicitly dropped by the rules?
    pub fn is_suppressed(&self, qualified_name: &str) -> bool {
        self.find_type(qualified_name)
            .is_some_and(|id| self.entry(id).suppressed)
    }
}
