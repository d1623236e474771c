use cxxbind_source::SourceLocation;
use smol_str::SmolStr;

use crate::{Access, TypeInfo};

/// Identity of a class or namespace item within one `CodeModel`.
///
/// Assigned in pre-order by [`CodeModel::new`]. The builder keys its
/// item-to-class map on this, which is what enforces the one-class-
/// per-item invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u32);

impl ItemId {
    pub const UNASSIGNED: Self = Self(u32::MAX);
}

/// Signed-or-unsigned 64-bit enumerator value.
///
/// The tag is explicit; the two spaces are never silently mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumValueNumber {
    Signed(i64),
    Unsigned(u64),
}

impl EnumValueNumber {
    pub fn is_negative(self) -> bool {
        matches!(self, Self::Signed(v) if v < 0)
    }

    /// Parse a plain decimal or `0x` hexadecimal literal.
    ///
    /// Values that fit in `i64` are signed; larger ones fall into the
    /// unsigned space. Returns `None` for expressions that need real
    /// constant evaluation.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            if let Ok(v) = i64::from_str_radix(hex, 16) {
                return Some(Self::Signed(v));
            }
            return u64::from_str_radix(hex, 16).ok().map(Self::Unsigned);
        }
        if let Ok(v) = text.parse::<i64>() {
            return Some(Self::Signed(v));
        }
        text.parse::<u64>().ok().map(Self::Unsigned)
    }
}

impl std::fmt::Display for EnumValueNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Signed(v) => write!(f, "{v}"),
            Self::Unsigned(v) => write!(f, "{v}"),
        }
    }
}

/// The root of a parsed translation set: one implicit global namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeModel {
    global: NamespaceItem,
}

impl CodeModel {
    /// Take ownership of the item tree and assign pre-order `ItemId`s
    /// to every namespace and class.
    pub fn new(mut global: NamespaceItem) -> Self {
        let mut next = 0u32;
        assign_namespace_ids(&mut global, &mut next);
        Self { global }
    }

    pub fn global_namespace(&self) -> &NamespaceItem {
        &self.global
    }

    pub fn is_empty(&self) -> bool {
        let g = &self.global;
        g.namespaces.is_empty()
            && g.classes.is_empty()
            && g.enums.is_empty()
            && g.functions.is_empty()
            && g.variables.is_empty()
    }

    /// Scope-qualified class lookup, e.g. `ns::Widget::Inner`.
    pub fn find_class(&self, qualified: &str) -> Option<&ClassItem> {
        let mut segments = qualified.split("::").peekable();
        let mut scope = &self.global;
        // Descend namespaces as long as segments name one.
        while let Some(&seg) = segments.peek() {
            match scope.namespaces.iter().find(|n| n.name == seg) {
                Some(ns) => {
                    scope = ns;
                    segments.next();
                }
                None => break,
            }
        }
        let first = segments.next()?;
        let mut class = scope.classes.iter().find(|c| c.name == first)?;
        for seg in segments {
            class = class.classes.iter().find(|c| c.name == seg)?;
        }
        Some(class)
    }
}

fn assign_namespace_ids(ns: &mut NamespaceItem, next: &mut u32) {
    ns.id = ItemId(*next);
    *next += 1;
    for class in &mut ns.classes {
        assign_class_ids(class, next);
    }
    for nested in &mut ns.namespaces {
        assign_namespace_ids(nested, next);
    }
}

fn assign_class_ids(class: &mut ClassItem, next: &mut u32) {
    class.id = ItemId(*next);
    *next += 1;
    for nested in &mut class.classes {
        assign_class_ids(nested, next);
    }
}

/// A namespace scope and its direct children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceItem {
    pub id: ItemId,
    pub name: SmolStr,
    pub location: SourceLocation,
    pub namespaces: Vec<NamespaceItem>,
    pub classes: Vec<ClassItem>,
    pub enums: Vec<EnumItem>,
    pub functions: Vec<FunctionItem>,
    pub variables: Vec<VariableItem>,
    pub typedefs: Vec<TypedefItem>,
}

impl NamespaceItem {
    pub fn named(name: &str) -> Self {
        Self {
            id: ItemId::UNASSIGNED,
            name: SmolStr::new(name),
            location: SourceLocation::default(),
            namespaces: Vec::new(),
            classes: Vec::new(),
            enums: Vec::new(),
            functions: Vec::new(),
            variables: Vec::new(),
            typedefs: Vec::new(),
        }
    }

    pub fn global() -> Self {
        Self::named("")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Struct,
    Union,
}

/// A textual base-class specifier, pre-resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseSpecifier {
    /// May carry template arguments textually, e.g. `Box<int>`.
    pub name: SmolStr,
    pub access: Access,
    pub is_virtual: bool,
}

impl BaseSpecifier {
    pub fn public(name: &str) -> Self {
        Self {
            name: SmolStr::new(name),
            access: Access::Public,
            is_virtual: false,
        }
    }
}

/// A class, struct, or union declaration and its direct members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassItem {
    pub id: ItemId,
    pub name: SmolStr,
    pub kind: ClassKind,
    pub access: Access,
    pub location: SourceLocation,
    pub bases: Vec<BaseSpecifier>,
    pub template_parameters: Vec<TemplateParameterItem>,
    pub functions: Vec<FunctionItem>,
    pub fields: Vec<VariableItem>,
    pub enums: Vec<EnumItem>,
    pub classes: Vec<ClassItem>,
    pub typedefs: Vec<TypedefItem>,
    pub using_declarations: Vec<UsingItem>,
    pub is_final: bool,
}

impl ClassItem {
    pub fn named(name: &str) -> Self {
        Self {
            id: ItemId::UNASSIGNED,
            name: SmolStr::new(name),
            kind: ClassKind::Class,
            access: Access::Public,
            location: SourceLocation::default(),
            bases: Vec::new(),
            template_parameters: Vec::new(),
            functions: Vec::new(),
            fields: Vec::new(),
            enums: Vec::new(),
            classes: Vec::new(),
            typedefs: Vec::new(),
            using_declarations: Vec::new(),
            is_final: false,
        }
    }

    pub fn is_template(&self) -> bool {
        !self.template_parameters.is_empty()
    }
}

/// A function or method declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionItem {
    pub name: SmolStr,
    pub location: SourceLocation,
    pub return_type: TypeInfo,
    pub arguments: Vec<ArgumentItem>,
    pub access: Access,
    pub is_constant: bool,
    pub is_static: bool,
    pub is_virtual: bool,
    pub is_pure_virtual: bool,
    pub is_override: bool,
    pub is_final: bool,
    pub is_explicit: bool,
    pub is_deleted: bool,
    pub is_defaulted: bool,
    pub is_deprecated: bool,
    pub is_variadic: bool,
    pub is_signal: bool,
    pub is_slot: bool,
}

impl FunctionItem {
    pub fn named(name: &str) -> Self {
        Self {
            name: SmolStr::new(name),
            location: SourceLocation::default(),
            return_type: TypeInfo::void(),
            arguments: Vec::new(),
            access: Access::Public,
            is_constant: false,
            is_static: false,
            is_virtual: false,
            is_pure_virtual: false,
            is_override: false,
            is_final: false,
            is_explicit: false,
            is_deleted: false,
            is_defaulted: false,
            is_deprecated: false,
            is_variadic: false,
            is_signal: false,
            is_slot: false,
        }
    }
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentItem {
    /// `None` for unnamed parameters; the builder invents `arg_<n>`.
    pub name: Option<SmolStr>,
    pub ty: TypeInfo,
    pub default_value: Option<SmolStr>,
}

impl ArgumentItem {
    pub fn new(name: &str, ty: TypeInfo) -> Self {
        Self {
            name: Some(SmolStr::new(name)),
            ty,
            default_value: None,
        }
    }

    pub fn unnamed(ty: TypeInfo) -> Self {
        Self {
            name: None,
            ty,
            default_value: None,
        }
    }

    #[must_use]
    pub fn with_default(mut self, expr: &str) -> Self {
        self.default_value = Some(SmolStr::new(expr));
        self
    }
}

/// A field or a namespace-scope variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableItem {
    pub name: SmolStr,
    pub location: SourceLocation,
    pub ty: TypeInfo,
    pub access: Access,
    pub is_static: bool,
    pub is_constexpr: bool,
    pub initializer: Option<SmolStr>,
}

impl VariableItem {
    pub fn new(name: &str, ty: TypeInfo) -> Self {
        Self {
            name: SmolStr::new(name),
            location: SourceLocation::default(),
            ty,
            access: Access::Public,
            is_static: false,
            is_constexpr: false,
            initializer: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumKind {
    /// Plain `enum E { ... }`.
    CStyle,
    /// `enum { ... }` contributing constants to the enclosing scope.
    Anonymous,
    /// `enum class E { ... }`.
    EnumClass,
}

/// An enum declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumItem {
    pub name: SmolStr,
    pub kind: EnumKind,
    pub location: SourceLocation,
    pub underlying_type: Option<TypeInfo>,
    pub enumerators: Vec<EnumeratorItem>,
    pub access: Access,
    pub is_deprecated: bool,
}

impl EnumItem {
    pub fn named(name: &str) -> Self {
        Self {
            name: SmolStr::new(name),
            kind: EnumKind::CStyle,
            location: SourceLocation::default(),
            underlying_type: None,
            enumerators: Vec::new(),
            access: Access::Public,
            is_deprecated: false,
        }
    }
}

/// One enumerator: name, spelled expression, and the computed value if
/// the upstream parser evaluated it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumeratorItem {
    pub name: SmolStr,
    pub value_text: Option<SmolStr>,
    pub value: Option<EnumValueNumber>,
    pub is_deprecated: bool,
}

impl EnumeratorItem {
    pub fn new(name: &str, value: i64) -> Self {
        Self {
            name: SmolStr::new(name),
            value_text: Some(SmolStr::new(value.to_string())),
            value: Some(EnumValueNumber::Signed(value)),
            is_deprecated: false,
        }
    }

    pub fn unvalued(name: &str) -> Self {
        Self {
            name: SmolStr::new(name),
            value_text: None,
            value: None,
            is_deprecated: false,
        }
    }
}

/// A `typedef`/`using` alias declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedefItem {
    pub name: SmolStr,
    pub target: TypeInfo,
    pub location: SourceLocation,
}

/// A class template parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateParameterItem {
    pub name: SmolStr,
    pub ordinal: u32,
    pub default_type: Option<TypeInfo>,
}

impl TemplateParameterItem {
    pub fn new(name: &str, ordinal: u32) -> Self {
        Self {
            name: SmolStr::new(name),
            ordinal,
            default_type: None,
        }
    }
}

/// A `using Base::member;` declaration inside a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsingItem {
    pub base_class: SmolStr,
    pub member: SmolStr,
    pub access: Access,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_model() -> CodeModel {
        let mut global = NamespaceItem::global();
        let mut ns = NamespaceItem::named("ui");
        let mut widget = ClassItem::named("Widget");
        widget.classes.push(ClassItem::named("Inner"));
        ns.classes.push(widget);
        global.namespaces.push(ns);
        global.classes.push(ClassItem::named("Free"));
        CodeModel::new(global)
    }

    #[test]
    fn ids_assigned_unique() {
        let model = sample_model();
        let mut seen = std::collections::HashSet::new();
        assert!(seen.insert(model.global_namespace().id));
        let free = &model.global_namespace().classes[0];
        assert!(seen.insert(free.id));
        let ns = &model.global_namespace().namespaces[0];
        assert!(seen.insert(ns.id));
        let widget = &ns.classes[0];
        assert!(seen.insert(widget.id));
        assert!(seen.insert(widget.classes[0].id));
    }

    #[test]
    fn find_class_through_namespace() {
        let model = sample_model();
        assert!(model.find_class("ui::Widget").is_some());
        assert!(model.find_class("ui::Widget::Inner").is_some());
        assert!(model.find_class("Free").is_some());
        assert!(model.find_class("ui::Missing").is_none());
        assert!(model.find_class("Widget").is_none());
    }

    #[test]
    fn enum_value_parse() {
        assert_eq!(
            EnumValueNumber::parse("42"),
            Some(EnumValueNumber::Signed(42))
        );
        assert_eq!(
            EnumValueNumber::parse("-1"),
            Some(EnumValueNumber::Signed(-1))
        );
        assert_eq!(
            EnumValueNumber::parse("0x10"),
            Some(EnumValueNumber::Signed(16))
        );
        assert_eq!(
            EnumValueNumber::parse("0xFFFFFFFFFFFFFFFF"),
            Some(EnumValueNumber::Unsigned(u64::MAX))
        );
        assert_eq!(EnumValueNumber::parse("1 << 3"), None);
    }

    #[test]
    fn enum_value_display_keeps_space() {
        assert_eq!(EnumValueNumber::Signed(-3).to_string(), "-3");
        assert_eq!(EnumValueNumber::Unsigned(u64::MAX).to_string(), u64::MAX.to_string());
        assert!(EnumValueNumber::Signed(-3).is_negative());
        assert!(!EnumValueNumber::Unsigned(3).is_negative());
    }

    #[test]
    fn empty_model() {
        let model = CodeModel::new(NamespaceItem::global());
        assert!(model.is_empty());
        assert!(!sample_model().is_empty());
    }
}
