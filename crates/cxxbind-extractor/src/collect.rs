use std::collections::HashSet;

use cxxbind_ast::TypeInfo;
use cxxbind_diag::{BuildDiag, BuildDiagKind};
use cxxbind_meta::{translate_type, ClassId, MetaFunction, MetaModel, MetaType};
use cxxbind_typesystem::TypeDatabase;
use smol_str::SmolStr;

/// A concrete smart-pointer instantiation found in the API surface,
/// with the smart-pointer template class resolved for the generator.
#[derive(Debug, Clone, PartialEq)]
pub struct InstantiatedSmartPointer {
    pub ty: MetaType,
    pub smart_pointer_class: Option<ClassId>,
}

pub(crate) struct CollectedInstantiations {
    pub containers: Vec<MetaType>,
    pub smart_pointers: Vec<InstantiatedSmartPointer>,
}

/// One global pass over every function signature, field type, and
/// injected code snippet, building the de-duplicated set of concrete
/// container and smart-pointer instantiations the generator must
/// emit.
pub(crate) fn collect_instantiations(
    model: &MetaModel,
    db: &TypeDatabase,
    diags: &mut Vec<BuildDiag>,
) -> CollectedInstantiations {
    let mut ctx = CollectContext {
        db,
        model,
        containers: Vec::new(),
        container_keys: HashSet::new(),
        smart_pointers: Vec::new(),
        smart_pointer_keys: HashSet::new(),
        diags,
    };

    for f in &model.global_functions {
        ctx.add_function(f);
    }
    for &id in &model.classes {
        let class = model.arena.get(id);
        if !db.entry(class.type_entry).generate_code {
            continue;
        }
        for f in &class.functions {
            ctx.add_function(f);
        }
        for field in &class.fields {
            ctx.add_type(&field.ty, &field.name);
        }
    }
    collect_from_snippets(&mut ctx);

    CollectedInstantiations {
        containers: ctx.containers,
        smart_pointers: ctx.smart_pointers,
    }
}

struct CollectContext<'a> {
    db: &'a TypeDatabase,
    model: &'a MetaModel,
    containers: Vec<MetaType>,
    container_keys: HashSet<String>,
    smart_pointers: Vec<InstantiatedSmartPointer>,
    smart_pointer_keys: HashSet<String>,
    diags: &'a mut Vec<BuildDiag>,
}

impl CollectContext<'_> {
    fn add_function(&mut self, f: &MetaFunction) {
        let context = f.name.clone();
        self.add_type(f.effective_return_type(), &context);
        for ty in f.effective_argument_types() {
            self.add_type(ty, &context);
        }
    }

    fn add_type(&mut self, ty: &MetaType, context: &str) {
        for inner in ty.instantiations() {
            self.add_type(inner, context);
        }
        let entry = self.db.entry(ty.entry());
        let is_container = entry.is_container();
        let is_smart_pointer = entry.is_smart_pointer() && entry.generate_code;
        if !is_container && !is_smart_pointer {
            return;
        }
        if ty.instantiations().is_empty() {
            // The template itself, not an instantiation.
            return;
        }
        if ty.has_template_children(self.db) {
            self.diags.push(BuildDiag::warning(
                BuildDiagKind::UnresolvedTemplateInstantiation {
                    type_name: SmolStr::new(ty.to_type_string(self.db)),
                    context: SmolStr::new(context),
                },
            ));
            return;
        }

        let key = ty.canonical_signature(self.db);
        if is_container {
            if self.container_keys.insert(key) {
                self.containers.push(ty.canonicalized(self.db));
            }
        } else if self.smart_pointer_keys.insert(key) {
            let canonical = ty.canonical_smart_pointer(self.db);
            let smart_pointer_class = self
                .model
                .smart_pointer_classes
                .iter()
                .copied()
                .find(|&id| self.model.arena.get(id).type_entry == ty.entry());
            self.smart_pointers.push(InstantiatedSmartPointer {
                ty: canonical,
                smart_pointer_class,
            });
        }
    }
}

const TO_TARGET_MARKER: &str = "%CONVERTTOTARGET[";
const TO_NATIVE_MARKER: &str = "%CONVERTTONATIVE[";

/// Scan injected code snippets for conversion markers naming types,
/// and fold those types into the instantiation set.
fn collect_from_snippets(ctx: &mut CollectContext<'_>) {
    let mut snippets: Vec<SmolStr> = Vec::new();
    for (_, entry) in ctx.db.iter() {
        for snip in &entry.code_snippets {
            snippets.push(snip.code.clone());
        }
    }
    for f in &ctx.model.global_functions {
        for snip in &f.code_snippets {
            snippets.push(snip.code.clone());
        }
    }
    for &id in &ctx.model.classes {
        for f in &ctx.model.arena.get(id).functions {
            for snip in &f.code_snippets {
                snippets.push(snip.code.clone());
            }
        }
    }

    for snippet in snippets {
        for marker in [TO_TARGET_MARKER, TO_NATIVE_MARKER] {
            collect_marked_types(ctx, &snippet, marker);
        }
    }
}

fn collect_marked_types(ctx: &mut CollectContext<'_>, code: &str, marker: &str) {
    let mut rest = code;
    while let Some(start) = rest.find(marker) {
        let after = &rest[start + marker.len()..];
        let Some(end) = after.find(']') else {
            return;
        };
        let spelling = &after[..end];
        if let Ok(info) = TypeInfo::parse(spelling) {
            let mut scratch = Vec::new();
            if let Ok(ty) =
                translate_type(&info, None, &ctx.model.arena, ctx.db, &mut scratch)
            {
                ctx.add_type(&ty, "injected code");
            }
        }
        rest = &after[end + 1..];
    }
}
