use cxxbind_ast::{ArrayBound, Indirection, TypeInfo};
use cxxbind_diag::{BuildDiag, BuildDiagKind};
use cxxbind_typesystem::{TypeDatabase, TypeEntryId};
use smol_str::SmolStr;

use crate::arena::{ClassArena, ClassId};
use crate::types::MetaType;

/// Why a type name did not resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFoundReason {
    Unknown,
    Ambiguous { candidates: Vec<SmolStr> },
}

/// Resolution failure, split in two: a name the type system does not
/// know at all, versus a name the rules know and explicitly dropped.
/// Callers log the two differently and must never treat either as
/// success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    NotFound { name: SmolStr, reason: NotFoundReason },
    Rejected { name: SmolStr },
}

impl TranslateError {
    fn not_found(name: &str) -> Self {
        Self::NotFound {
            name: SmolStr::new(name),
            reason: NotFoundReason::Unknown,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::NotFound {
                name,
                reason: NotFoundReason::Unknown,
            } => format!("type `{name}` not found"),
            Self::NotFound {
                name,
                reason: NotFoundReason::Ambiguous { candidates },
            } => {
                let list: Vec<&str> = candidates.iter().map(SmolStr::as_str).collect();
                format!("type `{name}` is ambiguous between {}", list.join(", "))
            }
            Self::Rejected { name } => {
                format!("type `{name}` is suppressed by the type system")
            }
        }
    }
}

/// Resolve a raw type reference into a semantic type.
///
/// Lookup order: the name exactly as spelled, then the enclosing
/// scopes of `scope` from innermost outward, then the template
/// parameter bindings of `scope`, then the global scope. First match
/// wins; several global candidates for an unqualified name are an
/// ambiguity error (also emitted as a warning diagnostic).
pub fn translate_type(
    info: &TypeInfo,
    scope: Option<ClassId>,
    arena: &ClassArena,
    db: &TypeDatabase,
    diags: &mut Vec<BuildDiag>,
) -> Result<MetaType, TranslateError> {
    let entry = find_type_entry(info, scope, arena, db, diags)?;
    if db.entry(entry).suppressed {
        return Err(TranslateError::Rejected {
            name: SmolStr::new(info.qualified_name.qualified()),
        });
    }
    let entry = db.resolve_typedefs(entry);

    let mut ty = MetaType::new(entry);
    ty.set_constant(info.constant);
    ty.set_volatile(info.volatile_);
    ty.set_reference(info.reference);
    ty.set_indirections(info.indirections.clone());

    // Known bounds stay arrays; an unknown bound degrades that
    // dimension to a pointer, remembering where it came from.
    let mut bounds = Vec::new();
    for bound in &info.array_bounds {
        match bound {
            ArrayBound::Known(n) => bounds.push(ArrayBound::Known(*n)),
            ArrayBound::Unknown => {
                ty.add_indirection(Indirection::Pointer);
                ty.set_degraded_from_array(true);
            }
        }
    }
    ty.set_array_bounds(bounds);

    let mut instantiations = Vec::with_capacity(info.template_args.len());
    for arg in &info.template_args {
        instantiations.push(translate_type(arg, scope, arena, db, diags)?);
    }
    ty.set_instantiations(instantiations);

    ty.set_original_description(info.to_type_string());
    ty.decide_usage_pattern(db);
    Ok(ty)
}

fn find_type_entry(
    info: &TypeInfo,
    scope: Option<ClassId>,
    arena: &ClassArena,
    db: &TypeDatabase,
    diags: &mut Vec<BuildDiag>,
) -> Result<TypeEntryId, TranslateError> {
    let spelled = info.qualified_name.qualified();

    // 1. Exactly as spelled.
    if let Some(id) = db.find_type(&spelled) {
        return Ok(id);
    }

    // 2. Enclosing scopes of the current class, innermost outward.
    let mut current = scope;
    while let Some(class_id) = current {
        let class = arena.get(class_id);
        let qualified = format!("{}::{}", class.qualified_name, spelled);
        if let Some(id) = db.find_type(&qualified) {
            return Ok(id);
        }
        current = class.enclosing_class;
    }

    if !info.qualified_name.is_qualified() {
        let name = info.qualified_name.name();

        // 3. Template parameter bindings of the current class.
        if let Some(class_id) = scope {
            for &param in &arena.get(class_id).template_parameters {
                if db.entry(param).name() == name.as_str() {
                    return Ok(param);
                }
            }
        }

        // 4. Global scope by unqualified name.
        let candidates = db.candidates(name);
        match candidates.len() {
            0 => {}
            1 => return Ok(candidates[0]),
            _ => {
                let names: Vec<SmolStr> = candidates
                    .iter()
                    .map(|&id| db.entry(id).qualified_name.clone())
                    .collect();
                diags.push(BuildDiag::warning(BuildDiagKind::AmbiguousTypeName {
                    name: name.clone(),
                    candidates: names.clone(),
                }));
                return Err(TranslateError::NotFound {
                    name: name.clone(),
                    reason: NotFoundReason::Ambiguous { candidates: names },
                });
            }
        }
    }

    Err(TranslateError::not_found(&spelled))
}
