use cxxbind_ast::ItemId;
use cxxbind_diag::{BuildDiag, BuildDiagKind};
use cxxbind_typesystem::TypeEntryKind;
use smol_str::SmolStr;

use crate::arena::ClassId;
use crate::builder::MetaBuilder;
use crate::class::MetaClass;
use crate::function::{FunctionKind, MetaFunction};
use crate::types::MetaType;

/// Produce (or reuse) the specialization of `template_id` bound to
/// `args`.
///
/// Smart-pointer argument lists are canonicalized first so
/// `SharedPtr<const Foo>` and `SharedPtr<Foo>` collapse into one
/// specialization. Every field and function type has template
/// parameters substituted; members whose types mention a parameter
/// the instantiation does not bind are dropped with a warning.
pub(crate) fn instantiate_template(
    builder: &mut MetaBuilder<'_>,
    template_id: ClassId,
    args: Vec<MetaType>,
) -> ClassId {
    let template = builder.arena.get(template_id);
    let entry = template.type_entry;
    let is_smart_pointer = builder.db.entry(entry).is_smart_pointer();

    let args: Vec<MetaType> = if is_smart_pointer {
        args.iter()
            .map(|a| {
                let mut c = a.clone();
                c.set_constant(false);
                c.set_reference(cxxbind_ast::ReferenceKind::None);
                c.decide_usage_pattern(builder.db);
                c
            })
            .collect()
    } else {
        args
    };

    let key = args
        .iter()
        .map(|a| a.canonical_signature(builder.db))
        .collect::<Vec<_>>()
        .join(",");
    if let Some(&existing) = builder.instantiation_cache.get(&(template_id, key.clone())) {
        return existing;
    }

    let template = builder.arena.get(template_id);
    let arg_spellings: Vec<String> = args
        .iter()
        .map(|a| a.to_type_string(builder.db))
        .collect();
    let qualified_name = format!("{}<{}>", template.qualified_name, arg_spellings.join(", "));
    let template_name = template.name.clone();
    let template_kind = template.kind;
    let enclosing = template.enclosing_class;
    let functions = template.functions.clone();
    let fields = template.fields.clone();
    let location = template.location.clone();

    let mut class = MetaClass::new(ItemId::UNASSIGNED, entry, template_kind, qualified_name.as_str());
    class.enclosing_class = enclosing;
    class.location = location;
    class.template_base_class = Some(template_id);
    class.template_instantiations = args.clone();
    let id = builder.arena.push(class);
    builder
        .class_by_qualified
        .insert(SmolStr::new(qualified_name.as_str()), id);
    builder
        .instantiation_cache
        .insert((template_id, key), id);

    for f in functions {
        match specialize_function(builder, &f, &args, id, &template_name) {
            Some(specialized) => builder.arena.get_mut(id).functions.push(specialized),
            None => {
                builder.diags.push(BuildDiag::warning(
                    BuildDiagKind::TemplateMemberDropped {
                        class: SmolStr::new(qualified_name.as_str()),
                        member: f.name.clone(),
                    },
                ));
            }
        }
    }
    let specialized_fields: Vec<_> = fields
        .iter()
        .map(|field| {
            specialize_type(&field.ty, &args, builder).map(|ty| {
                let mut out = field.clone();
                out.ty = ty;
                out.enclosing_class = id;
                out
            })
        })
        .collect();
    for (field, specialized) in fields.iter().zip(specialized_fields) {
        match specialized {
            Some(out) => builder.arena.get_mut(id).fields.push(out),
            None => {
                builder.diags.push(BuildDiag::warning(
                    BuildDiagKind::TemplateMemberDropped {
                        class: SmolStr::new(qualified_name.as_str()),
                        member: field.name.clone(),
                    },
                ));
            }
        }
    }

    id
}

fn specialize_function(
    builder: &MetaBuilder<'_>,
    f: &MetaFunction,
    bindings: &[MetaType],
    new_owner: ClassId,
    template_name: &str,
) -> Option<MetaFunction> {
    let mut out = f.clone();
    out.return_type = specialize_type(&f.return_type, bindings, builder)?;
    if let Some(modified) = &f.modified_return_type {
        out.modified_return_type = Some(specialize_type(modified, bindings, builder)?);
    }
    for arg in &mut out.arguments {
        arg.ty = specialize_type(&arg.ty, bindings, builder)?;
        if let Some(modified) = &arg.modified_ty {
            arg.modified_ty = Some(specialize_type(modified, bindings, builder)?);
        }
    }
    // Constructors keep tracking the specialized class's name.
    if out.kind.is_constructor() || out.kind == FunctionKind::Destructor {
        let new_name = builder.arena.get(new_owner).name.clone();
        if out.kind == FunctionKind::Destructor {
            out.name = SmolStr::new(format!("~{new_name}"));
        } else {
            out.name = new_name;
        }
        out.original_name = SmolStr::new(template_name);
    }
    out.owner = Some(new_owner);
    out.implementing_class = Some(new_owner);
    out.declaring_class = Some(new_owner);
    Some(out)
}

/// Substitute bound template parameters through one type, recursing
/// into instantiation arguments. Substitution goes exactly one level
/// per bound parameter; the recursion depth is the nesting present in
/// the source type, never unbounded.
fn specialize_type(
    ty: &MetaType,
    bindings: &[MetaType],
    builder: &MetaBuilder<'_>,
) -> Option<MetaType> {
    let entry = builder.db.entry(ty.entry());
    if let TypeEntryKind::TemplateArgument { ordinal } = entry.kind {
        let bound = bindings.get(ordinal as usize)?;
        let mut out = bound.clone();
        // The usage site's qualifiers wrap the bound type.
        if ty.is_constant() {
            out.set_constant(true);
        }
        if ty.reference() != cxxbind_ast::ReferenceKind::None {
            out.set_reference(ty.reference());
        }
        for level in ty.indirections() {
            out.add_indirection(*level);
        }
        out.decide_usage_pattern(builder.db);
        return Some(out);
    }

    let mut out = ty.clone();
    let mut instantiations = Vec::with_capacity(ty.instantiations().len());
    for inner in ty.instantiations() {
        instantiations.push(specialize_type(inner, bindings, builder)?);
    }
    out.set_instantiations(instantiations);
    out.decide_usage_pattern(builder.db);
    Some(out)
}

/// Canonicalize the stored instantiation arguments of every
/// smart-pointer specialization.
///
/// Instantiation through `instantiate_template` already canonicalizes;
/// this pass catches specializations whose arguments were mutated by
/// later fix-ups, and is a no-op otherwise.
pub(crate) fn fix_smart_pointers(builder: &mut MetaBuilder<'_>) {
    let ids: Vec<ClassId> = builder.arena.ids().collect();
    for id in ids {
        let class = builder.arena.get(id);
        if class.template_base_class.is_none()
            || !builder.db.entry(class.type_entry).is_smart_pointer()
        {
            continue;
        }
        let canonical: Vec<MetaType> = class
            .template_instantiations
            .iter()
            .map(|t| t.canonical_smart_pointer(builder.db))
            .collect();
        builder.arena.get_mut(id).template_instantiations = canonical;
    }
}
