use cxxbind_ast::TypeInfo;
use cxxbind_diag::{BuildDiag, BuildDiagKind};
use cxxbind_typesystem::FinalOverride;
use smol_str::SmolStr;

use crate::arena::ClassId;
use crate::builder::MetaBuilder;
use crate::class::ClassAttributes;
use crate::function::{CompareResult, FunctionAttributes, FunctionKind, MetaFunction};
use crate::template_inherit;
use crate::translate::translate_type;

/// Resolve the textual base-class list of `id` into arena references.
///
/// Runs strictly after discovery of every class: bases may be declared
/// later in translation-unit order or in another header. A base that
/// names a template instantiation triggers specialization. A base
/// that resolves to nothing weakens the class onto the configured
/// default superclass instead of dropping it.
pub(crate) fn setup_inheritance(builder: &mut MetaBuilder<'_>, id: ClassId) {
    let specs = builder.arena.get(id).base_class_names.clone();
    let class_name = builder.arena.get(id).qualified_name.clone();

    for spec in specs {
        let parsed = TypeInfo::parse(&spec.name);
        let info = match parsed {
            Ok(info) => info,
            Err(_) => {
                unresolved_base(builder, id, &class_name, &spec.name);
                continue;
            }
        };

        if !info.template_args.is_empty() {
            if let Some(template_id) = find_class_in_scope(builder, id, &info) {
                let mut args = Vec::with_capacity(info.template_args.len());
                let mut ok = true;
                for arg in &info.template_args {
                    match translate_type(arg, Some(id), &builder.arena, builder.db, &mut builder.diags)
                    {
                        Ok(t) => args.push(t),
                        Err(_) => {
                            ok = false;
                            break;
                        }
                    }
                }
                if ok {
                    let specialized =
                        template_inherit::instantiate_template(builder, template_id, args);
                    builder.arena.get_mut(id).base_classes.push(specialized);
                    continue;
                }
            }
            unresolved_base(builder, id, &class_name, &spec.name);
            continue;
        }

        match find_class_in_scope(builder, id, &info) {
            Some(base_id) if base_id != id => {
                builder.arena.get_mut(id).base_classes.push(base_id);
            }
            _ => unresolved_base(builder, id, &class_name, &spec.name),
        }
    }
}

/// Class lookup mirroring type resolution's scope walk: the name as
/// given, then qualified with each enclosing scope outward.
fn find_class_in_scope(
    builder: &MetaBuilder<'_>,
    scope: ClassId,
    info: &TypeInfo,
) -> Option<ClassId> {
    let spelled = info.qualified_name.qualified();
    if let Some(&found) = builder.class_by_qualified.get(spelled.as_str()) {
        return Some(found);
    }
    let mut current = Some(scope);
    while let Some(class_id) = current {
        let class = builder.arena.get(class_id);
        let qualified = format!("{}::{spelled}", class.qualified_name);
        if let Some(&found) = builder.class_by_qualified.get(qualified.as_str()) {
            return Some(found);
        }
        current = class.enclosing_class;
    }
    None
}

fn unresolved_base(builder: &mut MetaBuilder<'_>, id: ClassId, class_name: &SmolStr, base: &str) {
    builder.diags.push(BuildDiag::warning(BuildDiagKind::UnresolvedBaseClass {
        class: class_name.clone(),
        base: SmolStr::new(base),
    }));
    let fallback = builder
        .options
        .default_superclass
        .clone()
        .and_then(|name| builder.class_by_qualified.get(name.as_str()).copied());
    if let Some(fallback_id) = fallback {
        if fallback_id != id {
            let class = builder.arena.get_mut(id);
            class.default_superclass = Some(fallback_id);
            if !class.base_classes.contains(&fallback_id) {
                class.base_classes.push(fallback_id);
            }
        }
    }
}

/// Reconcile inherited and locally declared functions, base-first.
///
/// Diamonds reach shared bases twice; the `functions_fixed` guard
/// makes the second visit a no-op. Three outcomes per inherited
/// virtual: merge attributes into a matching local declaration,
/// shadow (same name, different effective arguments), or propagate a
/// copy tagged as such.
pub(crate) fn fix_functions(builder: &mut MetaBuilder<'_>, id: ClassId) {
    if builder.arena.get(id).functions_fixed {
        return;
    }
    builder.arena.get_mut(id).functions_fixed = true;

    add_using_constructors(builder, id);

    let base_ids = builder.arena.get(id).base_classes.clone();
    let class_name = builder.arena.get(id).qualified_name.clone();
    let mut funcs = builder.arena.get(id).functions.clone();

    for base in base_ids {
        fix_functions(builder, base);

        if builder.arena.get(base).is_final_in_target_lang() {
            builder.diags.push(BuildDiag::warning(BuildDiagKind::FinalClassExtended {
                class: builder.arena.get(base).qualified_name.clone(),
            }));
            builder
                .arena
                .get_mut(base)
                .attributes
                .remove(ClassAttributes::FINAL_IN_TARGET_LANG);
        }

        // What the base itself implements, plus virtuals it carries
        // from deeper up; propagated re-copies are filtered by the
        // implementing-class check.
        let super_funcs: Vec<MetaFunction> = builder
            .arena
            .get(base)
            .functions
            .iter()
            .filter(|sf| sf.implementing_class == Some(base) || sf.is_virtual())
            .cloned()
            .collect();

        let mut to_add: Vec<MetaFunction> = Vec::new();
        for sf in &super_funcs {
            if sf.modified_removed || sf.is_comparison_operator() {
                continue;
            }
            if sf.is_user_added() && sf.declaring_class != Some(id) {
                continue;
            }

            let mut add = inheritable(sf);
            for cf in funcs.iter_mut().filter(|f| !f.modified_removed) {
                let cmp = cf.compare_to(sf);
                if cmp.contains(CompareResult::EQUAL_MODIFIED_NAME) {
                    add = false;
                    if cmp.contains(CompareResult::EQUAL_ARGUMENTS) {
                        merge_override(builder, cf, sf, &class_name, base, id);
                    }
                } else if cmp.contains(CompareResult::EQUAL_NAME) && !sf.is_signal() {
                    // Renamed to dodge a conflict: the original stays
                    // out to keep the overload set unambiguous.
                    add = false;
                }
            }
            if add && !to_add.iter().any(|f| {
                let cmp = f.compare_to(sf);
                cmp.contains(CompareResult::EQUAL_MODIFIED_NAME)
                    && cmp.contains(CompareResult::EQUAL_ARGUMENTS)
            }) {
                to_add.push(sf.clone());
            }
        }

        for mut f in to_add {
            f.attributes.insert(FunctionAttributes::ADDED_BY_PROPAGATION);
            f.owner = Some(id);
            funcs.push(f);
        }
    }

    let mut has_private_constructors = false;
    let mut has_public_constructors = false;
    for f in &funcs {
        if f.is_abstract() {
            let class = builder.arena.get_mut(id);
            class.attributes.insert(ClassAttributes::ABSTRACT);
            class.attributes.remove(ClassAttributes::FINAL_IN_TARGET_LANG);
        }
        if f.is_constructor() && !f.is_propagated() {
            if f.is_private() {
                has_private_constructors = true;
            } else {
                has_public_constructors = true;
            }
        }
    }
    if has_private_constructors && !has_public_constructors {
        let class = builder.arena.get_mut(id);
        class.attributes.insert(ClassAttributes::ABSTRACT);
        class.attributes.remove(ClassAttributes::FINAL_IN_TARGET_LANG);
    }

    builder.arena.get_mut(id).functions = funcs;
}

/// Constructors and destructors never propagate; private members only
/// propagate while virtual (an abstract private override still has to
/// reach the derived class).
fn inheritable(f: &MetaFunction) -> bool {
    if f.is_constructor() || f.is_destructor() {
        return false;
    }
    !(f.is_private() && !f.is_virtual())
}

/// A local function matched an inherited virtual by name and
/// effective arguments: reconcile attributes, access, and the
/// declaring-class pointer on the local copy.
fn merge_override(
    builder: &mut MetaBuilder<'_>,
    cf: &mut MetaFunction,
    sf: &MetaFunction,
    class_name: &SmolStr,
    base: ClassId,
    id: ClassId,
) {
    let attributes = cf.attributes;
    if cf.is_virtual()
        && !attributes.contains(FunctionAttributes::OVERRIDE)
        && !attributes.contains(FunctionAttributes::FINAL_IN_TARGET_LANG)
    {
        // `override` not spelled out in the header; set it now that
        // the base virtual is known.
        cf.attributes.insert(FunctionAttributes::OVERRIDE);
    }

    if cf.attributes != sf.attributes
        && !cf.is_empty_function()
        && !sf.is_final_in_target_lang()
        && cf.is_final_in_target_lang()
    {
        cf.attributes.remove(FunctionAttributes::FINAL_IN_TARGET_LANG);
    }

    if cf.access != sf.access {
        builder.diags.push(BuildDiag::warning(BuildDiagKind::VisibilityNarrowed {
            class: class_name.clone(),
            function: cf.name.clone(),
        }));
        // A private override of an abstract method must stay in the
        // class so it remains concrete, but can never be called:
        // force it to an empty final stand-in.
        if cf.is_private() {
            cf.kind = FunctionKind::Empty;
            cf.attributes.insert(FunctionAttributes::FINAL_IN_TARGET_LANG);
        }
    }

    cf.declaring_class = sf.declaring_class;

    if sf.is_final_in_target_lang()
        && !sf.is_private()
        && !cf.is_private()
        && !sf.is_static()
        && !cf.is_static()
        && cf.implementing_class != sf.implementing_class
    {
        let base_class = builder.arena.get(base);
        let minimal = sf.minimal_signature(builder.db);
        let excused = builder
            .db
            .function_modifications(&base_class.qualified_name, &minimal)
            .iter()
            .any(|m| {
                m.final_override == Some(FinalOverride::NonFinal)
                    || m.access == Some(cxxbind_typesystem::ModifiedAccess::Private)
            });
        if !excused {
            builder.diags.push(BuildDiag::warning(BuildDiagKind::ShadowedFunction {
                base_class: base_class.qualified_name.clone(),
                derived_class: builder.arena.get(id).qualified_name.clone(),
                function: cf.name.clone(),
            }));
        }
    }
}

/// Synthesize constructors pulled in by `using Base::Base;`.
///
/// Only fires when the derived class declares no constructor of its
/// own, to keep the overload set unambiguous.
fn add_using_constructors(builder: &mut MetaBuilder<'_>, id: ClassId) {
    if builder.arena.get(id).using_members.is_empty() {
        return;
    }
    let has_declared = builder
        .arena
        .get(id)
        .declared_constructors()
        .any(|f| !f.attributes.contains(FunctionAttributes::SYNTHESIZED));
    if has_declared {
        return;
    }

    let class_name = builder.arena.get(id).name.clone();
    let usings = builder.arena.get(id).using_members.clone();
    let base_ids = builder.arena.get(id).base_classes.clone();

    let mut synthesized = Vec::new();
    for using in &usings {
        if using.member != using.base_class && using.member != class_name {
            continue;
        }
        let Some(&base_id) = base_ids.iter().find(|&&b| {
            let base = builder.arena.get(b);
            base.name == using.base_class || base.qualified_name == using.base_class
        }) else {
            continue;
        };
        for ctor in builder.arena.get(base_id).declared_constructors() {
            if ctor.is_private() || ctor.is_copy_constructor() {
                continue;
            }
            let mut copy = ctor.clone();
            copy.name = class_name.clone();
            copy.original_name = class_name.clone();
            copy.kind = FunctionKind::Constructor;
            copy.attributes.insert(FunctionAttributes::SYNTHESIZED);
            copy.owner = Some(id);
            copy.implementing_class = Some(id);
            copy.declaring_class = Some(id);
            synthesized.push(copy);
        }
    }
    builder.arena.get_mut(id).functions.extend(synthesized);
}
