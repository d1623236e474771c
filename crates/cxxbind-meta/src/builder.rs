use std::collections::HashMap;

use cxxbind_ast::{ClassItem, ClassKind, CodeModel, ItemId, NamespaceItem};
use cxxbind_diag::BuildDiag;
use cxxbind_typesystem::{TypeDatabase, TypeEntryId};
use smol_str::SmolStr;

use crate::arena::{ClassArena, ClassId};
use crate::class::{ClassAttributes, MetaClass, MetaClassKind};
use crate::enums::MetaEnum;
use crate::function::MetaFunction;
use crate::inheritance;
use crate::members;
use crate::reject::{RejectEntry, RejectLog, RejectReason};
use crate::template_inherit;
use crate::types::MetaType;

/// Configuration surface of one build run.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Drop declarations the header marks deprecated instead of
    /// binding them.
    pub skip_deprecated: bool,
    /// Qualified name of the class substituted for unresolvable base
    /// classes. The class must itself be part of the model.
    pub default_superclass: Option<SmolStr>,
}

/// Errors that abort the whole run. No partial model survives any of
/// these; the only failure signal callers get is the `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FatalBuildError {
    EmptyCodeModel,
    EmptyTypeSystem,
    /// A true dependency cycle between classes. Diamonds are not
    /// cycles; this needs rule-induced back edges.
    DependencyCycle { cycle: Vec<SmolStr> },
}

impl std::fmt::Display for FatalBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCodeModel => f.write_str("code model contains no declarations"),
            Self::EmptyTypeSystem => f.write_str("type system contains no entries"),
            Self::DependencyCycle { cycle } => {
                let names: Vec<&str> = cycle.iter().map(SmolStr::as_str).collect();
                write!(f, "dependency cycle between classes: {}", names.join(" -> "))
            }
        }
    }
}

impl std::error::Error for FatalBuildError {}

/// The finished metamodel, frozen at the end of a build run.
#[derive(Debug)]
pub struct MetaModel {
    pub arena: ClassArena,
    /// Non-template classes and namespaces, in discovery order.
    /// Topological ordering is the extractor's concern.
    pub classes: Vec<ClassId>,
    /// Uninstantiated template classes; kept for lookup, never
    /// emitted directly.
    pub template_classes: Vec<ClassId>,
    /// Smart-pointer template classes, for pointee resolution.
    pub smart_pointer_classes: Vec<ClassId>,
    pub global_functions: Vec<MetaFunction>,
    pub global_enums: Vec<MetaEnum>,
    /// Reverse lookup from an enum's type entry to the resolved enum.
    pub enums_by_entry: HashMap<TypeEntryId, MetaEnum>,
    pub diagnostics: Vec<BuildDiag>,
    pub rejections: RejectLog,
}

impl MetaModel {
    pub fn find_class(&self, qualified_name: &str) -> Option<&MetaClass> {
        self.arena
            .find_by_qualified_name(qualified_name)
            .map(|id| self.arena.get(id))
    }

    pub fn find_enum_for_entry(&self, entry: TypeEntryId) -> Option<&MetaEnum> {
        self.enums_by_entry.get(&entry)
    }
}

/// Per-run mutable state of the metamodel builder.
///
/// Everything the passes cache lives here and dies with the run;
/// nothing survives into a second build.
pub struct MetaBuilder<'a> {
    pub(crate) db: &'a TypeDatabase,
    pub(crate) options: BuildOptions,
    pub(crate) arena: ClassArena,
    pub(crate) item_to_class: HashMap<ItemId, ClassId>,
    pub(crate) class_by_qualified: HashMap<SmolStr, ClassId>,
    /// (template class, canonical instantiation key) to the
    /// specialization already created for it.
    pub(crate) instantiation_cache: HashMap<(ClassId, String), ClassId>,
    pub(crate) global_functions: Vec<MetaFunction>,
    pub(crate) global_enums: Vec<MetaEnum>,
    pub(crate) enums_by_entry: HashMap<TypeEntryId, MetaEnum>,
    pub(crate) rejections: RejectLog,
    pub(crate) diags: Vec<BuildDiag>,
}

impl<'a> MetaBuilder<'a> {
    /// Run the whole pipeline: discovery, member traversal,
    /// inheritance setup with template instantiation, fix-up, and
    /// packaging.
    pub fn build(
        model: &CodeModel,
        db: &'a TypeDatabase,
        options: BuildOptions,
    ) -> Result<MetaModel, FatalBuildError> {
        if db.is_empty() {
            return Err(FatalBuildError::EmptyTypeSystem);
        }
        if model.is_empty() {
            return Err(FatalBuildError::EmptyCodeModel);
        }

        let mut builder = MetaBuilder {
            db,
            options,
            arena: ClassArena::new(),
            item_to_class: HashMap::new(),
            class_by_qualified: HashMap::new(),
            instantiation_cache: HashMap::new(),
            global_functions: Vec::new(),
            global_enums: Vec::new(),
            enums_by_entry: HashMap::new(),
            rejections: RejectLog::new(),
            diags: Vec::new(),
        };

        // Phase 1: discovery. Collects (item, class) pairs so member
        // traversal does not have to re-walk the item tree.
        let mut discovered: Vec<(&ClassItem, ClassId)> = Vec::new();
        builder.discover_namespace(model.global_namespace(), None, "", &mut discovered);

        // Phase 2: member traversal.
        for &(item, class_id) in &discovered {
            members::traverse_class_members(&mut builder, item, class_id);
        }
        builder.traverse_namespace_level(model.global_namespace(), None, "");

        // Phase 3: inheritance resolution. Template-instantiation
        // bases create specializations as a side effect, so snapshot
        // the id range first.
        let discovered_ids: Vec<ClassId> = builder.arena.ids().collect();
        for id in discovered_ids {
            inheritance::setup_inheritance(&mut builder, id);
        }

        // The constructibility predicates and the fix-up pass recurse
        // over the base graph; a rule-induced cycle must be caught
        // before either runs.
        builder.detect_inheritance_cycles()?;

        // Synthesized constructors need resolved bases.
        builder.add_synthesized_constructors();

        // Phase 4: fix-up, base-first, then smart-pointer
        // canonicalization.
        let all_ids: Vec<ClassId> = builder.arena.ids().collect();
        for id in all_ids {
            inheritance::fix_functions(&mut builder, id);
        }
        template_inherit::fix_smart_pointers(&mut builder);

        Ok(builder.finish())
    }

    fn discover_namespace<'m>(
        &mut self,
        ns: &'m NamespaceItem,
        enclosing: Option<ClassId>,
        prefix: &str,
        discovered: &mut Vec<(&'m ClassItem, ClassId)>,
    ) {
        let (ns_class, ns_prefix) = if ns.name.is_empty() {
            (enclosing, String::new())
        } else {
            let qualified = format!("{prefix}{}", ns.name);
            let class = self.discover_namespace_class(ns, &qualified, enclosing);
            (class, format!("{qualified}::"))
        };
        for class_item in &ns.classes {
            self.discover_class(class_item, ns_class, &ns_prefix, discovered);
        }
        for nested in &ns.namespaces {
            self.discover_namespace(nested, ns_class, &ns_prefix, discovered);
        }
    }

    fn discover_namespace_class(
        &mut self,
        ns: &NamespaceItem,
        qualified: &str,
        enclosing: Option<ClassId>,
    ) -> Option<ClassId> {
        if let Some(&existing) = self.item_to_class.get(&ns.id) {
            return Some(existing);
        }
        let Some(entry) = self.db.find_type(qualified) else {
            self.rejections.reject_class(RejectEntry::new(
                qualified,
                qualified,
                RejectReason::NotInTypeSystem,
                "namespace has no type entry",
            ));
            return None;
        };
        if self.db.entry(entry).suppressed {
            self.rejections.reject_class(RejectEntry::new(
                qualified,
                qualified,
                RejectReason::GenerationDisabled,
                "namespace suppressed by type system",
            ));
            return None;
        }
        let mut class = MetaClass::new(ns.id, entry, MetaClassKind::Namespace, qualified);
        class.enclosing_class = enclosing;
        class.location = ns.location.clone();
        let id = self.arena.push(class);
        self.register_class(ns.id, qualified, id, enclosing);
        Some(id)
    }

    fn discover_class<'m>(
        &mut self,
        item: &'m ClassItem,
        enclosing: Option<ClassId>,
        prefix: &str,
        discovered: &mut Vec<(&'m ClassItem, ClassId)>,
    ) -> Option<ClassId> {
        if let Some(&existing) = self.item_to_class.get(&item.id) {
            return Some(existing);
        }
        let qualified = format!("{prefix}{}", item.name);
        let Some(entry) = self.db.find_type(&qualified) else {
            self.rejections.reject_class(RejectEntry::new(
                qualified.as_str(),
                qualified.as_str(),
                RejectReason::NotInTypeSystem,
                "",
            ));
            return None;
        };
        let entry_data = self.db.entry(entry);
        if entry_data.suppressed {
            self.rejections.reject_class(RejectEntry::new(
                qualified.as_str(),
                qualified.as_str(),
                RejectReason::GenerationDisabled,
                "class suppressed by type system",
            ));
            return None;
        }
        if !entry_data.is_complex() {
            self.rejections.reject_class(RejectEntry::new(
                qualified.as_str(),
                qualified.as_str(),
                RejectReason::RedefinedToNotClass,
                "type entry does not describe a class",
            ));
            return None;
        }

        let kind = match item.kind {
            ClassKind::Class => MetaClassKind::Class,
            ClassKind::Struct => MetaClassKind::Struct,
            ClassKind::Union => MetaClassKind::Union,
        };
        let mut class = MetaClass::new(item.id, entry, kind, qualified.as_str());
        class.enclosing_class = enclosing;
        class.location = item.location.clone();
        class.base_class_names = item.bases.clone();
        if item.is_final {
            class.attributes.insert(ClassAttributes::FINAL_IN_TARGET_LANG);
        }

        // Template parameters must be pre-registered in the rule
        // table; the database is frozen before the build starts.
        let mut params = Vec::with_capacity(item.template_parameters.len());
        for p in &item.template_parameters {
            match self.db.find_type(&format!("{qualified}::{}", p.name)) {
                Some(param_entry) => params.push(param_entry),
                None => {
                    self.rejections.reject_class(RejectEntry::new(
                        qualified.as_str(),
                        qualified.as_str(),
                        RejectReason::NotInTypeSystem,
                        format!("template parameter `{}` not registered", p.name),
                    ));
                    return None;
                }
            }
        }
        class.template_parameters = params;

        let id = self.arena.push(class);
        self.register_class(item.id, &qualified, id, enclosing);
        discovered.push((item, id));

        let inner_prefix = format!("{qualified}::");
        for nested in &item.classes {
            self.discover_class(nested, Some(id), &inner_prefix, discovered);
        }
        Some(id)
    }

    fn register_class(
        &mut self,
        item: ItemId,
        qualified: &str,
        id: ClassId,
        enclosing: Option<ClassId>,
    ) {
        self.item_to_class.insert(item, id);
        self.class_by_qualified.insert(SmolStr::new(qualified), id);
        if let Some(parent) = enclosing {
            self.arena.get_mut(parent).inner_classes.push(id);
        }
    }

    /// Attach namespace-level enums and functions: enums to their
    /// namespace class (or the global enum list), functions to the
    /// global function list.
    fn traverse_namespace_level(
        &mut self,
        ns: &NamespaceItem,
        ns_class: Option<ClassId>,
        prefix: &str,
    ) {
        for enum_item in &ns.enums {
            if let Some(meta_enum) = members::traverse_enum(self, enum_item, ns_class, prefix) {
                match ns_class {
                    Some(id) => self.arena.get_mut(id).enums.push(meta_enum),
                    None => self.global_enums.push(meta_enum),
                }
            }
        }
        for function_item in &ns.functions {
            let owner_key = prefix.trim_end_matches(':');
            if let Some(f) = members::traverse_function(self, function_item, None, owner_key) {
                self.global_functions.push(f);
            }
        }
        for nested in &ns.namespaces {
            let nested_class = self.item_to_class.get(&nested.id).copied();
            let nested_prefix = format!("{prefix}{}::", nested.name);
            self.traverse_namespace_level(nested, nested_class, &nested_prefix);
        }
    }

    /// Inheritance must form a DAG. Legal C++ cannot declare a base
    /// cycle, but the consumed code model can; report it as a fatal
    /// configuration error instead of recursing into it.
    fn detect_inheritance_cycles(&self) -> Result<(), FatalBuildError> {
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            White,
            Grey,
            Black,
        }
        fn visit(
            arena: &ClassArena,
            id: ClassId,
            colors: &mut [Color],
            path: &mut Vec<ClassId>,
        ) -> Result<(), FatalBuildError> {
            match colors[id.index()] {
                Color::Black => return Ok(()),
                Color::Grey => {
                    let start = path.iter().position(|&p| p == id).unwrap_or(0);
                    let cycle = path[start..]
                        .iter()
                        .chain(std::iter::once(&id))
                        .map(|&p| arena.get(p).qualified_name.clone())
                        .collect();
                    return Err(FatalBuildError::DependencyCycle { cycle });
                }
                Color::White => {}
            }
            colors[id.index()] = Color::Grey;
            path.push(id);
            for &base in &arena.get(id).base_classes {
                visit(arena, base, colors, path)?;
            }
            path.pop();
            colors[id.index()] = Color::Black;
            Ok(())
        }

        let mut colors = vec![Color::White; self.arena.len()];
        let mut path = Vec::new();
        for id in self.arena.ids() {
            visit(&self.arena, id, &mut colors, &mut path)?;
        }
        Ok(())
    }

    fn add_synthesized_constructors(&mut self) {
        let void_entry = self.db.find_type("void");
        let ids: Vec<ClassId> = self.arena.ids().collect();
        for id in ids {
            if self.arena.get(id).is_namespace() || self.arena.get(id).is_template() {
                continue;
            }
            if self.arena.can_add_default_constructor(id, self.db) {
                let void_ty = self.make_void_type(void_entry);
                let ctor = self
                    .arena
                    .make_synthesized_default_constructor(id, void_ty);
                self.arena.get_mut(id).functions.push(ctor);
            }
            if self.arena.can_add_default_copy_constructor(id, self.db) {
                let void_ty = self.make_void_type(void_entry);
                let mut copy = self
                    .arena
                    .make_synthesized_default_constructor(id, void_ty);
                copy.kind = crate::function::FunctionKind::CopyConstructor;
                let mut arg_ty = MetaType::new(self.arena.get(id).type_entry);
                arg_ty.set_constant(true);
                arg_ty.set_reference(cxxbind_ast::ReferenceKind::LValue);
                arg_ty.decide_usage_pattern(self.db);
                copy.arguments.push(crate::argument::MetaArgument::new(
                    "other", arg_ty, 0,
                ));
                self.arena.get_mut(id).functions.push(copy);
            }
        }
    }

    fn make_void_type(&self, void_entry: Option<TypeEntryId>) -> MetaType {
        // A type system without `void` still builds; synthesized
        // constructors then reuse the class's own entry, which is
        // never inspected for constructors.
        let entry = void_entry.unwrap_or_else(|| {
            self.db
                .iter()
                .next()
                .map(|(id, _)| id)
                .expect("type database is non-empty")
        });
        let mut t = MetaType::new(entry);
        t.decide_usage_pattern(self.db);
        t
    }

    pub(crate) fn void_type(&self) -> MetaType {
        self.make_void_type(self.db.find_type("void"))
    }

    fn finish(self) -> MetaModel {
        let mut classes = Vec::new();
        let mut template_classes = Vec::new();
        let mut smart_pointer_classes = Vec::new();
        for (id, class) in self.arena.iter() {
            if class.is_template() {
                if self.db.entry(class.type_entry).is_smart_pointer() {
                    smart_pointer_classes.push(id);
                }
                template_classes.push(id);
            } else {
                classes.push(id);
            }
        }

        let mut global_functions = self.global_functions;
        global_functions.sort_by(|a, b| a.name.cmp(&b.name));
        let mut global_enums = self.global_enums;
        global_enums.sort_by(|a, b| a.name.cmp(&b.name));

        MetaModel {
            arena: self.arena,
            classes,
            template_classes,
            smart_pointer_classes,
            global_functions,
            global_enums,
            enums_by_entry: self.enums_by_entry,
            diagnostics: cxxbind_diag::sorted_unique(self.diags),
            rejections: self.rejections,
        }
    }
}
