//! Fixture harness for assembling a code model and a type system in
//! one fluent value, running the full extraction pipeline, and
//! dumping deterministic summaries for comparisons.

use std::fmt::Write;

use cxxbind_ast::{
    ArgumentItem, ClassItem, CodeModel, EnumItem, FunctionItem, NamespaceItem, TypeInfo,
};
use cxxbind_extractor::{ApiExtractor, ExtractorResult};
use cxxbind_meta::{BuildOptions, FatalBuildError};
use cxxbind_typesystem::{
    FieldModification, FunctionModification, TypeDatabaseBuilder, TypeEntry,
};

/// Accumulates a code model and a type-system table, then runs the
/// pipeline.
pub struct ModelFixture {
    global: NamespaceItem,
    db: TypeDatabaseBuilder,
    options: BuildOptions,
}

impl ModelFixture {
    /// Start with the primitive entries every scenario needs.
    pub fn new() -> Self {
        let mut db = TypeDatabaseBuilder::new();
        db.push(TypeEntry::void());
        for name in ["int", "double", "bool", "char", "unsigned int", "long long"] {
            db.push(TypeEntry::primitive(name));
        }
        Self {
            global: NamespaceItem::global(),
            db,
            options: BuildOptions::default(),
        }
    }

    /// An empty fixture without even the primitives registered.
    pub fn bare() -> Self {
        Self {
            global: NamespaceItem::global(),
            db: TypeDatabaseBuilder::new(),
            options: BuildOptions::default(),
        }
    }

    #[must_use]
    pub fn entry(mut self, entry: TypeEntry) -> Self {
        self.db.push(entry);
        self
    }

    /// Register a flags entry over a previously registered enum.
    #[must_use]
    pub fn flags_entry(mut self, name: &str, underlying_enum: &str) -> Self {
        let underlying = self
            .db
            .find(underlying_enum)
            .unwrap_or_else(|| panic!("enum `{underlying_enum}` must be registered first"));
        self.db.push(TypeEntry::new(
            name,
            cxxbind_typesystem::TypeEntryKind::Flags { underlying },
        ));
        self
    }

    #[must_use]
    pub fn function_modification(mut self, owner: &str, m: FunctionModification) -> Self {
        self.db.add_function_modification(owner, m);
        self
    }

    #[must_use]
    pub fn field_modification(mut self, owner: &str, m: FieldModification) -> Self {
        self.db.add_field_modification(owner, m);
        self
    }

    #[must_use]
    pub fn class(mut self, class: ClassItem) -> Self {
        self.global.classes.push(class);
        self
    }

    #[must_use]
    pub fn namespace(mut self, ns: NamespaceItem) -> Self {
        self.global.namespaces.push(ns);
        self
    }

    #[must_use]
    pub fn global_enum(mut self, e: EnumItem) -> Self {
        self.global.enums.push(e);
        self
    }

    #[must_use]
    pub fn global_function(mut self, f: FunctionItem) -> Self {
        self.global.functions.push(f);
        self
    }

    #[must_use]
    pub fn options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Result<ExtractorResult, FatalBuildError> {
        let model = CodeModel::new(self.global);
        let db = self.db.freeze();
        ApiExtractor::run(&model, &db, self.options)
    }

    /// Build, panicking on fatal errors; for the common test path.
    pub fn build_ok(self) -> ExtractorResult {
        self.build().expect("pipeline reported a fatal error")
    }
}

impl Default for ModelFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Shorthand for a method item: `method("f", "void", &[("x", "int")])`.
pub fn method(name: &str, return_type: &str, args: &[(&str, &str)]) -> FunctionItem {
    let mut f = FunctionItem::named(name);
    f.return_type = TypeInfo::parse(return_type).expect("parsable return type");
    for (arg_name, arg_type) in args {
        f.arguments.push(ArgumentItem::new(
            arg_name,
            TypeInfo::parse(arg_type).expect("parsable argument type"),
        ));
    }
    f
}

pub fn virtual_method(name: &str, return_type: &str, args: &[(&str, &str)]) -> FunctionItem {
    let mut f = method(name, return_type, args);
    f.is_virtual = true;
    f
}

pub fn pure_virtual_method(name: &str, return_type: &str, args: &[(&str, &str)]) -> FunctionItem {
    let mut f = virtual_method(name, return_type, args);
    f.is_pure_virtual = true;
    f
}

pub fn constructor(class_name: &str, args: &[(&str, &str)]) -> FunctionItem {
    method(class_name, "void", args)
}

/// Dump a class's function list as stable text: one function per
/// line with kind, access, and the attribute letters that matter for
/// override resolution.
pub fn dump_functions(result: &ExtractorResult, qualified_name: &str) -> String {
    let class = result
        .find_class(qualified_name)
        .unwrap_or_else(|| panic!("class `{qualified_name}` not found"));
    let mut lines: Vec<String> = class
        .functions
        .iter()
        .map(|f| {
            let mut line = String::new();
            let _ = write!(
                line,
                "{} kind={:?} access={:?}",
                f.name, f.kind, f.access
            );
            if f.is_virtual() {
                line.push_str(" virtual");
            }
            if f.is_abstract() {
                line.push_str(" abstract");
            }
            if f.attributes.contains(cxxbind_meta::FunctionAttributes::OVERRIDE) {
                line.push_str(" override");
            }
            if f.is_final_in_target_lang() {
                line.push_str(" final");
            }
            if f.is_propagated() {
                line.push_str(" propagated");
            }
            let _ = write!(
                line,
                " declaring={:?}",
                f.declaring_class
                    .map(|id| result.arena().get(id).qualified_name.clone())
            );
            line
        })
        .collect();
    lines.sort();
    lines.join("\n")
}
