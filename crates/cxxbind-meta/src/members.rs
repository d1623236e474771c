use cxxbind_ast::{
    Access, ClassItem, EnumItem, EnumKind, EnumValueNumber, FunctionItem, TypeInfo, VariableItem,
};
use cxxbind_diag::{BuildDiag, BuildDiagKind};
use cxxbind_typesystem::{FinalOverride, ModifiedAccess, TypeEntryKind};
use smol_str::SmolStr;

use crate::argument::MetaArgument;
use crate::arena::ClassId;
use crate::builder::MetaBuilder;
use crate::class::{ClassAttributes, UsingMember};
use crate::enums::{MetaEnum, MetaEnumValue};
use crate::field::MetaField;
use crate::function::{FunctionAttributes, FunctionKind, MetaFunction};
use crate::reject::{RejectEntry, RejectReason};
use crate::translate::{translate_type, TranslateError};

/// Populate one discovered class with enums, fields, using members,
/// and functions. Enums come first so default-value rewriting can see
/// them.
pub(crate) fn traverse_class_members(
    builder: &mut MetaBuilder<'_>,
    item: &ClassItem,
    class_id: ClassId,
) {
    let prefix = format!("{}::", builder.arena.get(class_id).qualified_name);

    for enum_item in &item.enums {
        if let Some(meta_enum) = traverse_enum(builder, enum_item, Some(class_id), &prefix) {
            builder.arena.get_mut(class_id).enums.push(meta_enum);
        }
    }

    for field_item in &item.fields {
        if let Some(field) = traverse_field(builder, field_item, class_id) {
            builder.arena.get_mut(class_id).fields.push(field);
        }
    }

    for using in &item.using_declarations {
        builder.arena.get_mut(class_id).using_members.push(UsingMember {
            base_class: using.base_class.clone(),
            member: using.member.clone(),
            access: using.access,
        });
    }

    let owner_key = builder.arena.get(class_id).qualified_name.clone();
    let mut seen_signatures: Vec<String> = Vec::new();
    for function_item in &item.functions {
        if let Some(f) = traverse_function(builder, function_item, Some(class_id), &owner_key) {
            seen_signatures.push(f.minimal_signature(builder.db));
            builder.arena.get_mut(class_id).functions.push(f);
        }
    }

    // Rules that matched nothing usually mean a typo in the signature
    // pattern; surface them.
    for m in builder.db.all_function_modifications(&owner_key) {
        if !seen_signatures.iter().any(|sig| m.matches(sig)) {
            builder.diags.push(BuildDiag::warning(
                BuildDiagKind::UnmatchedModification {
                    class: owner_key.clone(),
                    signature: m.signature.clone(),
                },
            ));
        }
    }
}

/// What a function's name says about its role in `class_name`.
fn classify_kind(item: &FunctionItem, class_name: Option<&str>) -> FunctionKind {
    if let Some(class_name) = class_name {
        if item.name == class_name {
            if item.arguments.len() == 1 {
                let arg = &item.arguments[0].ty;
                if arg.qualified_name.name() == class_name && arg.indirections.is_empty() {
                    match arg.reference {
                        cxxbind_ast::ReferenceKind::LValue => return FunctionKind::CopyConstructor,
                        cxxbind_ast::ReferenceKind::RValue => return FunctionKind::MoveConstructor,
                        cxxbind_ast::ReferenceKind::None => {}
                    }
                }
            }
            return FunctionKind::Constructor;
        }
        if let Some(stripped) = item.name.strip_prefix('~') {
            if stripped == class_name {
                return FunctionKind::Destructor;
            }
        }
    }
    if let Some(suffix) = item.name.strip_prefix("operator") {
        if !suffix.is_empty() && !suffix.chars().next().is_some_and(char::is_alphanumeric) {
            return classify_operator(suffix.trim());
        }
        if suffix.starts_with(' ') {
            return FunctionKind::ConversionOperator;
        }
    }
    if item.is_signal {
        return FunctionKind::Signal;
    }
    if item.is_slot {
        return FunctionKind::Slot;
    }
    FunctionKind::Normal
}

fn classify_operator(op: &str) -> FunctionKind {
    match op {
        "=" => FunctionKind::AssignmentOperator,
        "==" | "!=" | "<" | ">" | "<=" | ">=" | "<=>" => FunctionKind::ComparisonOperator,
        "<<" | ">>" | "<<=" | ">>=" => FunctionKind::ShiftOperator,
        "+" | "-" | "*" | "/" | "%" | "+=" | "-=" | "*=" | "/=" | "%=" | "++" | "--" => {
            FunctionKind::ArithmeticOperator
        }
        "&" | "|" | "^" | "~" | "&=" | "|=" | "^=" => FunctionKind::BitwiseOperator,
        "!" | "&&" | "||" => FunctionKind::LogicalOperator,
        "[]" => FunctionKind::SubscriptOperator,
        "()" => FunctionKind::CallOperator,
        _ => FunctionKind::ConversionOperator,
    }
}

/// Build one function record: classify, resolve types, apply rules.
///
/// Returns `None` after recording a rejection (or silently for
/// rule-removed synthesized input). `owner_key` is the qualified name
/// modifications are registered under; empty for the global scope.
pub(crate) fn traverse_function(
    builder: &mut MetaBuilder<'_>,
    item: &FunctionItem,
    class_id: Option<ClassId>,
    owner_key: &str,
) -> Option<MetaFunction> {
    let class_name = class_id.map(|id| builder.arena.get(id).name.clone());
    let kind = classify_kind(item, class_name.as_deref());
    let sort_key = if owner_key.is_empty() {
        SmolStr::new(item.name.as_str())
    } else {
        SmolStr::new(format!("{owner_key}::{}", item.name))
    };

    let reject_constructor = |builder: &mut MetaBuilder<'_>| {
        if let Some(id) = class_id {
            if kind.is_constructor() {
                builder
                    .arena
                    .get_mut(id)
                    .attributes
                    .insert(ClassAttributes::HAS_REJECTED_CONSTRUCTOR);
            }
        }
    };

    if item.is_deleted {
        reject_constructor(builder);
        builder.rejections.reject_function(RejectEntry::new(
            sort_key.clone(),
            spelled_signature(item),
            RejectReason::ApiIncompatible,
            "deleted function",
        ));
        return None;
    }
    if builder.options.skip_deprecated && item.is_deprecated {
        builder.rejections.reject_function(RejectEntry::new(
            sort_key.clone(),
            spelled_signature(item),
            RejectReason::Deprecated,
            "",
        ));
        return None;
    }

    let return_type = if kind.is_constructor() || kind == FunctionKind::Destructor {
        builder.void_type()
    } else {
        match resolve(builder, &item.return_type, class_id) {
            Ok(t) => t,
            Err(err) => {
                builder.rejections.reject_function(RejectEntry::new(
                    sort_key.clone(),
                    spelled_signature(item),
                    RejectReason::UnmatchedReturnType,
                    err.message(),
                ));
                return None;
            }
        }
    };

    let mut f = MetaFunction::new(item.name.clone(), kind, return_type);
    f.access = item.access;
    f.original_access = item.access;
    f.is_constant = item.is_constant;
    f.owner = class_id;
    f.implementing_class = class_id;
    f.declaring_class = class_id;
    f.documentation = SmolStr::default();

    for (i, arg_item) in item.arguments.iter().enumerate() {
        let ty = match resolve(builder, &arg_item.ty, class_id) {
            Ok(t) => t,
            Err(err) => {
                reject_constructor(builder);
                builder.rejections.reject_function(RejectEntry::new(
                    sort_key.clone(),
                    spelled_signature(item),
                    RejectReason::UnmatchedArgumentType,
                    err.message(),
                ));
                return None;
            }
        };
        let (name, has_real_name) = match &arg_item.name {
            Some(n) => (n.clone(), true),
            None => (SmolStr::new(format!("arg_{i}")), false),
        };
        let mut arg = MetaArgument::new(name, ty, i);
        arg.has_real_name = has_real_name;
        if let Some(expr) = &arg_item.default_value {
            arg.original_default_value = Some(expr.clone());
            arg.default_value = Some(fix_default_value(builder, expr, &arg.ty, &f.original_name));
        }
        f.arguments.push(arg);
    }

    if item.is_variadic {
        match builder.db.find_type("...") {
            Some(varargs) => {
                let mut ty = crate::types::MetaType::new(varargs);
                ty.decide_usage_pattern(builder.db);
                let position = f.arguments.len();
                let mut arg = MetaArgument::new("...", ty, position);
                arg.has_real_name = false;
                f.arguments.push(arg);
            }
            None => {
                builder.rejections.reject_function(RejectEntry::new(
                    sort_key.clone(),
                    spelled_signature(item),
                    RejectReason::ApiIncompatible,
                    "variadic function without a varargs entry",
                ));
                return None;
            }
        }
    }

    if item.is_virtual {
        f.attributes.insert(FunctionAttributes::VIRTUAL);
    }
    if item.is_pure_virtual {
        f.attributes.insert(FunctionAttributes::ABSTRACT);
        f.attributes.insert(FunctionAttributes::VIRTUAL);
    }
    if item.is_override {
        f.attributes.insert(FunctionAttributes::OVERRIDE);
    }
    if item.is_final {
        f.attributes.insert(FunctionAttributes::FINAL_IN_TARGET_LANG);
    }
    if item.is_static {
        f.attributes.insert(FunctionAttributes::STATIC);
    }
    if item.is_explicit {
        f.attributes.insert(FunctionAttributes::EXPLICIT);
    }
    if item.is_deprecated {
        f.attributes.insert(FunctionAttributes::DEPRECATED);
    }
    if item.is_defaulted {
        f.attributes.insert(FunctionAttributes::DEFAULTED);
    }

    if !apply_function_modifications(builder, &mut f, class_id, owner_key, &sort_key) {
        return None;
    }
    Some(f)
}

/// Apply the matching rules to `f`. Returns false when a replacement
/// type failed to resolve and the function was rejected instead.
fn apply_function_modifications(
    builder: &mut MetaBuilder<'_>,
    f: &mut MetaFunction,
    class_id: Option<ClassId>,
    owner_key: &str,
    sort_key: &SmolStr,
) -> bool {
    let minimal = f.minimal_signature(builder.db);
    let mods: Vec<cxxbind_typesystem::FunctionModification> = builder
        .db
        .function_modifications(owner_key, &minimal)
        .into_iter()
        .cloned()
        .collect();

    for m in &mods {
        if m.removed {
            f.modified_removed = true;
        }
        if let Some(rename) = &m.rename {
            f.name = rename.clone();
        }
        if let Some(access) = m.access {
            f.access = match access {
                ModifiedAccess::Private => Access::Private,
                ModifiedAccess::Protected => Access::Protected,
                ModifiedAccess::Public => Access::Public,
            };
        }
        match m.final_override {
            Some(FinalOverride::Final) => {
                f.attributes.insert(FunctionAttributes::FINAL_IN_TARGET_LANG);
            }
            Some(FinalOverride::NonFinal) => {
                f.attributes.remove(FunctionAttributes::FINAL_IN_TARGET_LANG);
            }
            None => {}
        }
        if let Some(replaced) = &m.replaced_return_type {
            match parse_and_resolve(builder, replaced, class_id) {
                Ok(t) => f.modified_return_type = Some(t),
                Err(err) => {
                    builder.rejections.reject_function(RejectEntry::new(
                        sort_key.clone(),
                        minimal.clone(),
                        RejectReason::UnmatchedReturnType,
                        err.message(),
                    ));
                    return false;
                }
            }
        }
        for am in &m.argument_mods {
            let Some(arg) = f.arguments.get_mut(am.position) else {
                continue;
            };
            if am.removed {
                arg.removed = true;
            }
            if let Some(rename) = &am.rename {
                arg.name = rename.clone();
                arg.has_real_name = true;
            }
            if let Some(expr) = &am.replaced_default_value {
                arg.default_value = Some(expr.clone());
            }
            if let Some(replaced) = &am.replaced_type {
                match parse_and_resolve(builder, replaced, class_id) {
                    Ok(t) => f.arguments[am.position].modified_ty = Some(t),
                    Err(err) => {
                        builder.rejections.reject_function(RejectEntry::new(
                            sort_key.clone(),
                            minimal.clone(),
                            RejectReason::UnmatchedArgumentType,
                            err.message(),
                        ));
                        return false;
                    }
                }
            }
        }
        f.code_snippets.extend(m.code_snippets.iter().cloned());
    }
    true
}

fn resolve(
    builder: &mut MetaBuilder<'_>,
    info: &TypeInfo,
    scope: Option<ClassId>,
) -> Result<crate::types::MetaType, TranslateError> {
    translate_type(info, scope, &builder.arena, builder.db, &mut builder.diags)
}

fn parse_and_resolve(
    builder: &mut MetaBuilder<'_>,
    spelling: &str,
    scope: Option<ClassId>,
) -> Result<crate::types::MetaType, TranslateError> {
    let info = TypeInfo::parse(spelling).map_err(|_| TranslateError::NotFound {
        name: SmolStr::new(spelling),
        reason: crate::translate::NotFoundReason::Unknown,
    })?;
    resolve(builder, &info, scope)
}

fn spelled_signature(item: &FunctionItem) -> String {
    let mut s = String::from(item.name.as_str());
    s.push('(');
    for (i, arg) in item.arguments.iter().enumerate() {
        if i > 0 {
            s.push(',');
        }
        s.push_str(&arg.ty.to_type_string());
    }
    s.push(')');
    s
}

/// Rewrite a default-value expression so it stays valid outside its
/// declaring scope: qualify enumerators and bare constructor calls.
fn fix_default_value(
    builder: &mut MetaBuilder<'_>,
    expr: &str,
    arg_type: &crate::types::MetaType,
    function: &str,
) -> SmolStr {
    let trimmed = expr.trim();
    if trimmed.is_empty()
        || trimmed == "nullptr"
        || trimmed == "true"
        || trimmed == "false"
        || trimmed.starts_with('"')
        || trimmed.starts_with('\'')
        || trimmed.chars().next().is_some_and(|c| c.is_ascii_digit() || c == '-')
        || trimmed.contains("::")
    {
        return SmolStr::new(trimmed);
    }

    let entry = builder.db.entry(arg_type.entry());
    match entry.kind {
        TypeEntryKind::Enum | TypeEntryKind::Flags { .. } => {
            let enum_entry = match entry.kind {
                TypeEntryKind::Flags { underlying } => underlying,
                _ => arg_type.entry(),
            };
            if let Some(meta_enum) = builder.enums_by_entry.get(&enum_entry) {
                if meta_enum.find_value(trimmed).is_some() {
                    let scope = if meta_enum.kind == EnumKind::EnumClass {
                        meta_enum.qualified_name.as_str().to_owned()
                    } else {
                        enclosing_scope_of(&meta_enum.qualified_name)
                    };
                    if scope.is_empty() {
                        return SmolStr::new(trimmed);
                    }
                    return SmolStr::new(format!("{scope}::{trimmed}"));
                }
            }
        }
        TypeEntryKind::Value | TypeEntryKind::Object => {
            // `Foo(...)` spelled with the unqualified class name.
            if let Some(rest) = trimmed.strip_prefix(entry.name()) {
                if rest.starts_with('(') {
                    return SmolStr::new(format!("{}{rest}", entry.qualified_name));
                }
            }
        }
        _ => {}
    }

    builder.diags.push(BuildDiag::info(BuildDiagKind::DefaultValueUnqualified {
        function: SmolStr::new(function),
        expression: SmolStr::new(trimmed),
    }));
    SmolStr::new(trimmed)
}

fn enclosing_scope_of(qualified: &str) -> String {
    match qualified.rfind("::") {
        Some(pos) => qualified[..pos].to_owned(),
        None => String::new(),
    }
}

/// Build one field record, honoring field rules.
pub(crate) fn traverse_field(
    builder: &mut MetaBuilder<'_>,
    item: &VariableItem,
    class_id: ClassId,
) -> Option<MetaField> {
    let owner = builder.arena.get(class_id).qualified_name.clone();
    let sort_key = format!("{owner}::{}", item.name);

    let ty = match resolve(builder, &item.ty, Some(class_id)) {
        Ok(t) => t,
        Err(err) => {
            builder.rejections.reject_field(RejectEntry::new(
                sort_key.as_str(),
                sort_key.as_str(),
                RejectReason::UnmatchedArgumentType,
                err.message(),
            ));
            return None;
        }
    };

    let mut field = MetaField::new(class_id, item.name.clone(), ty);
    field.access = item.access;
    field.is_static = item.is_static;

    for m in builder.db.field_modifications(&owner, &item.name) {
        if m.removed {
            // Intentional removal by rule: not a rejection.
            return None;
        }
        if let Some(rename) = &m.rename {
            field.name = rename.clone();
        }
    }
    Some(field)
}

/// Build one enum record.
///
/// Anonymous enums are matched against the rule table through their
/// first enumerator, the only stable name they have.
pub(crate) fn traverse_enum(
    builder: &mut MetaBuilder<'_>,
    item: &EnumItem,
    enclosing: Option<ClassId>,
    prefix: &str,
) -> Option<MetaEnum> {
    let lookup_name = if item.name.is_empty() {
        let first = item.enumerators.first()?;
        format!("{prefix}{}", first.name)
    } else {
        format!("{prefix}{}", item.name)
    };
    let sort_key = lookup_name.clone();

    if builder.options.skip_deprecated && item.is_deprecated {
        builder.rejections.reject_enum(RejectEntry::new(
            sort_key.as_str(),
            sort_key.as_str(),
            RejectReason::Deprecated,
            "",
        ));
        return None;
    }

    let Some(entry) = builder.db.find_type(&lookup_name) else {
        builder.rejections.reject_enum(RejectEntry::new(
            sort_key.as_str(),
            sort_key.as_str(),
            RejectReason::NotInTypeSystem,
            "",
        ));
        return None;
    };
    let entry_data = builder.db.entry(entry);
    if entry_data.suppressed {
        builder.rejections.reject_enum(RejectEntry::new(
            sort_key.as_str(),
            sort_key.as_str(),
            RejectReason::GenerationDisabled,
            "enum suppressed by type system",
        ));
        return None;
    }
    if !entry_data.is_enum() {
        builder.rejections.reject_enum(RejectEntry::new(
            sort_key.as_str(),
            sort_key.as_str(),
            RejectReason::RedefinedToNotClass,
            "type entry does not describe an enum",
        ));
        return None;
    }

    let enum_name = SmolStr::new(entry_data.target_lang_name());
    let qualified_name = entry_data.qualified_name.clone();

    let mut values = Vec::with_capacity(item.enumerators.len());
    let mut next_value = EnumValueNumber::Signed(0);
    for enumerator in &item.enumerators {
        let value = enumerator
            .value
            .or_else(|| {
                enumerator
                    .value_text
                    .as_deref()
                    .and_then(EnumValueNumber::parse)
            })
            .unwrap_or_else(|| {
                if enumerator.value_text.is_some() {
                    builder.diags.push(BuildDiag::warning(
                        BuildDiagKind::EnumValueUnparsed {
                            enum_name: SmolStr::new(qualified_name.as_str()),
                            value: enumerator
                                .value_text
                                .clone()
                                .unwrap_or_default(),
                        },
                    ));
                }
                next_value
            });
        next_value = successor(value);
        let mut v = MetaEnumValue::new(enumerator.name.clone(), value);
        v.string_value = enumerator.value_text.clone().unwrap_or_default();
        v.is_deprecated = enumerator.is_deprecated;
        values.push(v);
    }

    let underlying_unsigned = item
        .underlying_type
        .as_ref()
        .is_some_and(|t| t.qualified_name.qualified().contains("unsigned"));
    let is_signed = MetaEnum::deduce_signedness(&values, underlying_unsigned);

    let meta_enum = MetaEnum {
        type_entry: entry,
        name: enum_name,
        qualified_name,
        kind: item.kind,
        access: item.access,
        values,
        enclosing_class: enclosing,
        flags_entry: builder.db.flags_entry_for_enum(entry),
        is_deprecated: item.is_deprecated,
        is_signed,
        documentation: SmolStr::default(),
    };
    builder
        .enums_by_entry
        .insert(entry, meta_enum.clone());
    Some(meta_enum)
}

fn successor(value: EnumValueNumber) -> EnumValueNumber {
    match value {
        EnumValueNumber::Signed(v) => EnumValueNumber::Signed(v.saturating_add(1)),
        EnumValueNumber::Unsigned(v) => EnumValueNumber::Unsigned(v.saturating_add(1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_classification() {
        let mut item = FunctionItem::named("operator==");
        assert_eq!(classify_kind(&item, None), FunctionKind::ComparisonOperator);
        item.name = "operator<<".into();
        assert_eq!(classify_kind(&item, None), FunctionKind::ShiftOperator);
        item.name = "operator+=".into();
        assert_eq!(classify_kind(&item, None), FunctionKind::ArithmeticOperator);
        item.name = "operator[]".into();
        assert_eq!(classify_kind(&item, None), FunctionKind::SubscriptOperator);
        item.name = "operator()".into();
        assert_eq!(classify_kind(&item, None), FunctionKind::CallOperator);
        item.name = "operator bool".into();
        assert_eq!(classify_kind(&item, None), FunctionKind::ConversionOperator);
        item.name = "operator=".into();
        assert_eq!(classify_kind(&item, None), FunctionKind::AssignmentOperator);
    }

    #[test]
    fn constructor_classification() {
        let mut ctor = FunctionItem::named("Widget");
        assert_eq!(
            classify_kind(&ctor, Some("Widget")),
            FunctionKind::Constructor
        );
        assert_eq!(classify_kind(&ctor, Some("Other")), FunctionKind::Normal);

        ctor.arguments.push(cxxbind_ast::ArgumentItem::unnamed(
            TypeInfo::parse("const Widget &").unwrap(),
        ));
        assert_eq!(
            classify_kind(&ctor, Some("Widget")),
            FunctionKind::CopyConstructor
        );

        ctor.arguments[0].ty = TypeInfo::parse("Widget &&").unwrap();
        assert_eq!(
            classify_kind(&ctor, Some("Widget")),
            FunctionKind::MoveConstructor
        );
    }

    #[test]
    fn destructor_classification() {
        let dtor = FunctionItem::named("~Widget");
        assert_eq!(
            classify_kind(&dtor, Some("Widget")),
            FunctionKind::Destructor
        );
        assert_eq!(classify_kind(&dtor, Some("Other")), FunctionKind::Normal);
    }

    #[test]
    fn signal_slot_classification() {
        let mut item = FunctionItem::named("valueChanged");
        item.is_signal = true;
        assert_eq!(classify_kind(&item, Some("Widget")), FunctionKind::Signal);
        item.is_signal = false;
        item.is_slot = true;
        assert_eq!(classify_kind(&item, Some("Widget")), FunctionKind::Slot);
    }

    #[test]
    fn operator_name_prefix_does_not_misfire() {
        // A function merely named with the prefix is not an operator.
        let item = FunctionItem::named("operatorCount");
        assert_eq!(classify_kind(&item, None), FunctionKind::Normal);
    }

    #[test]
    fn enum_successor_values() {
        assert_eq!(
            successor(EnumValueNumber::Signed(-2)),
            EnumValueNumber::Signed(-1)
        );
        assert_eq!(
            successor(EnumValueNumber::Unsigned(7)),
            EnumValueNumber::Unsigned(8)
        );
    }
}
