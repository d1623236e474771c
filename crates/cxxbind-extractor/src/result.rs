use std::collections::HashMap;

use cxxbind_ast::CodeModel;
use cxxbind_diag::BuildDiag;
use cxxbind_meta::{
    BuildOptions, ClassArena, ClassId, FatalBuildError, MetaBuilder, MetaClass, MetaEnum,
    MetaFunction, MetaType, RejectLog,
};
use cxxbind_typesystem::{TypeDatabase, TypeEntryId};

use crate::collect::{collect_instantiations, InstantiatedSmartPointer};
use crate::topo::topological_sort;

/// Entry point of the extraction pipeline.
pub struct ApiExtractor;

impl ApiExtractor {
    /// Build the metamodel, order it, collect instantiations, and
    /// package everything into an immutable result.
    ///
    /// The `Err` is the only failure signal: no partially built model
    /// ever escapes.
    pub fn run(
        model: &CodeModel,
        db: &TypeDatabase,
        options: BuildOptions,
    ) -> Result<ExtractorResult, FatalBuildError> {
        let mut meta_model = MetaBuilder::build(model, db, options)?;
        let ordered = topological_sort(&meta_model.arena, &meta_model.classes, &[])?;

        let mut diags = std::mem::take(&mut meta_model.diagnostics);
        let collected = collect_instantiations(&meta_model, db, &mut diags);

        Ok(ExtractorResult {
            arena: meta_model.arena,
            ordered_classes: ordered,
            template_classes: meta_model.template_classes,
            smart_pointer_classes: meta_model.smart_pointer_classes,
            global_functions: meta_model.global_functions,
            global_enums: meta_model.global_enums,
            enums_by_entry: meta_model.enums_by_entry,
            instantiated_containers: collected.containers,
            instantiated_smart_pointers: collected.smart_pointers,
            diagnostics: cxxbind_diag::sorted_unique(diags),
            rejections: meta_model.rejections,
        })
    }
}

/// The frozen output of one extraction run.
///
/// Ownership of the class arena moves in here wholesale; the builder
/// keeps nothing. Accessors only, no mutation.
#[derive(Debug)]
pub struct ExtractorResult {
    arena: ClassArena,
    ordered_classes: Vec<ClassId>,
    template_classes: Vec<ClassId>,
    smart_pointer_classes: Vec<ClassId>,
    global_functions: Vec<MetaFunction>,
    global_enums: Vec<MetaEnum>,
    enums_by_entry: HashMap<TypeEntryId, MetaEnum>,
    instantiated_containers: Vec<MetaType>,
    instantiated_smart_pointers: Vec<InstantiatedSmartPointer>,
    diagnostics: Vec<BuildDiag>,
    rejections: RejectLog,
}

impl ExtractorResult {
    pub fn arena(&self) -> &ClassArena {
        &self.arena
    }

    /// Classes in dependency order: bases before derived, enclosing
    /// before inner, embedded value types before embedders.
    pub fn classes(&self) -> impl Iterator<Item = &MetaClass> {
        self.ordered_classes.iter().map(|&id| self.arena.get(id))
    }

    pub fn ordered_class_ids(&self) -> &[ClassId] {
        &self.ordered_classes
    }

    pub fn template_classes(&self) -> impl Iterator<Item = &MetaClass> {
        self.template_classes.iter().map(|&id| self.arena.get(id))
    }

    pub fn smart_pointer_classes(&self) -> impl Iterator<Item = &MetaClass> {
        self.smart_pointer_classes
            .iter()
            .map(|&id| self.arena.get(id))
    }

    pub fn find_class(&self, qualified_name: &str) -> Option<&MetaClass> {
        self.arena
            .find_by_qualified_name(qualified_name)
            .map(|id| self.arena.get(id))
    }

    pub fn global_functions(&self) -> &[MetaFunction] {
        &self.global_functions
    }

    pub fn global_enums(&self) -> &[MetaEnum] {
        &self.global_enums
    }

    /// Reverse lookup from a type entry to its resolved enum,
    /// wherever it was declared.
    pub fn find_enum_for_entry(&self, entry: TypeEntryId) -> Option<&MetaEnum> {
        self.enums_by_entry.get(&entry)
    }

    pub fn instantiated_containers(&self) -> &[MetaType] {
        &self.instantiated_containers
    }

    pub fn instantiated_smart_pointers(&self) -> &[InstantiatedSmartPointer] {
        &self.instantiated_smart_pointers
    }

    pub fn diagnostics(&self) -> &[BuildDiag] {
        &self.diagnostics
    }

    pub fn rejections(&self) -> &RejectLog {
        &self.rejections
    }
}
