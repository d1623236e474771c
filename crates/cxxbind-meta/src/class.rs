use cxxbind_ast::{Access, BaseSpecifier, ItemId};
use cxxbind_source::SourceLocation;
use cxxbind_typesystem::{TypeDatabase, TypeEntryId};
use smol_str::SmolStr;

use crate::arena::{ClassArena, ClassId};
use crate::enums::MetaEnum;
use crate::field::MetaField;
use crate::function::{FunctionAttributes, FunctionKind, MetaFunction};
use crate::types::MetaType;

/// What the class node models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaClassKind {
    Class,
    Struct,
    Union,
    /// Namespaces are class nodes with only static members; they host
    /// scope lookup and enum/function attachment.
    Namespace,
}

/// Attribute bitmask for classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClassAttributes(u32);

impl ClassAttributes {
    pub const ABSTRACT: Self = Self(1 << 0);
    pub const FINAL_IN_TARGET_LANG: Self = Self(1 << 1);
    pub const DEPRECATED: Self = Self(1 << 2);
    /// A constructor was rejected (deleted or unbindable), so
    /// synthesizing a default constructor is off the table.
    pub const HAS_REJECTED_CONSTRUCTOR: Self = Self(1 << 3);
    pub const HAS_REJECTED_DEFAULT_CONSTRUCTOR: Self = Self(1 << 4);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

/// A member introduced by a `using Base::member;` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsingMember {
    pub base_class: SmolStr,
    pub member: SmolStr,
    pub access: Access,
}

/// A resolved class, struct, union, or namespace node.
///
/// Lives in the [`ClassArena`]; owns its functions, fields, and enums
/// exclusively. Everything pointing at another class does so by
/// `ClassId`.
#[derive(Debug, Clone)]
pub struct MetaClass {
    pub id: ClassId,
    /// Code-model identity; `UNASSIGNED` for synthesized
    /// specializations.
    pub item: ItemId,
    pub type_entry: TypeEntryId,
    pub kind: MetaClassKind,
    pub name: SmolStr,
    pub qualified_name: SmolStr,
    pub attributes: ClassAttributes,
    pub location: SourceLocation,
    /// Textual base list from the header; consumed by inheritance
    /// setup.
    pub base_class_names: Vec<BaseSpecifier>,
    pub base_classes: Vec<ClassId>,
    pub default_superclass: Option<ClassId>,
    pub enclosing_class: Option<ClassId>,
    pub inner_classes: Vec<ClassId>,
    pub functions: Vec<MetaFunction>,
    pub fields: Vec<MetaField>,
    pub enums: Vec<MetaEnum>,
    /// Template-parameter entries, in declaration order. Non-empty
    /// marks an uninstantiated template.
    pub template_parameters: Vec<TypeEntryId>,
    /// Set on specializations: the template this was instantiated
    /// from and the bound argument types.
    pub template_base_class: Option<ClassId>,
    pub template_instantiations: Vec<MetaType>,
    pub using_members: Vec<UsingMember>,
    /// Fix-up guard: diamonds reach a base twice, the pass runs once.
    pub functions_fixed: bool,
}

impl MetaClass {
    pub fn new(
        item: ItemId,
        type_entry: TypeEntryId,
        kind: MetaClassKind,
        qualified_name: impl Into<SmolStr>,
    ) -> Self {
        let qualified_name: SmolStr = qualified_name.into();
        let name = unqualified_name(&qualified_name);
        Self {
            id: ClassId(u32::MAX),
            item,
            type_entry,
            kind,
            name,
            qualified_name,
            attributes: ClassAttributes::default(),
            location: SourceLocation::default(),
            base_class_names: Vec::new(),
            base_classes: Vec::new(),
            default_superclass: None,
            enclosing_class: None,
            inner_classes: Vec::new(),
            functions: Vec::new(),
            fields: Vec::new(),
            enums: Vec::new(),
            template_parameters: Vec::new(),
            template_base_class: None,
            template_instantiations: Vec::new(),
            using_members: Vec::new(),
            functions_fixed: false,
        }
    }

    pub fn is_namespace(&self) -> bool {
        self.kind == MetaClassKind::Namespace
    }

    pub fn is_template(&self) -> bool {
        !self.template_parameters.is_empty()
    }

    pub fn is_template_specialization(&self) -> bool {
        self.template_base_class.is_some()
    }

    pub fn is_abstract(&self) -> bool {
        self.attributes.contains(ClassAttributes::ABSTRACT)
    }

    pub fn is_final_in_target_lang(&self) -> bool {
        self.attributes.contains(ClassAttributes::FINAL_IN_TARGET_LANG)
    }

    /// User-declared (or rule-added) constructors; propagated copies
    /// from bases do not count.
    pub fn declared_constructors(&self) -> impl Iterator<Item = &MetaFunction> {
        self.functions
            .iter()
            .filter(|f| f.is_constructor() && !f.is_propagated())
    }

    pub fn has_constructors(&self) -> bool {
        self.declared_constructors().next().is_some()
    }

    pub fn has_private_constructor(&self) -> bool {
        self.declared_constructors().any(MetaFunction::is_private)
    }

    pub fn has_public_constructor(&self) -> bool {
        self.declared_constructors().any(|f| f.access == Access::Public)
    }

    pub fn has_copy_constructor(&self) -> bool {
        self.declared_constructors().any(MetaFunction::is_copy_constructor)
    }

    pub fn has_private_copy_constructor(&self) -> bool {
        self.declared_constructors()
            .any(|f| f.is_copy_constructor() && f.is_private())
    }

    fn destructor(&self) -> Option<&MetaFunction> {
        self.functions.iter().find(|f| f.is_destructor())
    }

    pub fn has_private_destructor(&self) -> bool {
        self.destructor().is_some_and(MetaFunction::is_private)
    }

    pub fn has_virtual_destructor(&self) -> bool {
        self.destructor().is_some_and(MetaFunction::is_virtual)
    }

    pub fn has_virtual_functions(&self) -> bool {
        self.functions.iter().any(|f| f.is_virtual())
    }

    pub fn has_protected_members(&self) -> bool {
        self.functions.iter().any(|f| f.access == Access::Protected)
            || self.fields.iter().any(|f| f.access == Access::Protected)
    }

    /// The output-facing function list: everything the rules did not
    /// remove, minus invalid records and private propagated copies.
    pub fn functions_in_target_lang(&self) -> Vec<&MetaFunction> {
        self.functions
            .iter()
            .filter(|f| {
                !f.modified_removed
                    && !f.is_invalid()
                    && !(f.is_private() && f.is_propagated())
            })
            .collect()
    }

    pub fn find_functions<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MetaFunction> {
        self.functions.iter().filter(move |f| f.name == name)
    }

    pub fn find_enum(&self, name: &str) -> Option<&MetaEnum> {
        self.enums.iter().find(|e| e.name == name)
    }

    pub fn find_enum_value(&self, name: &str) -> Option<&crate::enums::MetaEnumValue> {
        self.enums.iter().find_map(|e| e.find_value(name))
    }

    pub fn find_field(&self, name: &str) -> Option<&MetaField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Strip the scope qualifier without touching template argument
/// text: `ui::Box<ns::Foo>` keeps `Box<ns::Foo>`.
fn unqualified_name(qualified: &str) -> SmolStr {
    let head_len = qualified.find('<').unwrap_or(qualified.len());
    match qualified[..head_len].rfind("::") {
        Some(pos) => SmolStr::new(&qualified[pos + 2..]),
        None => SmolStr::new(qualified),
    }
}

/// A field blocks implicit construction when it could not be
/// initialized by a compiler-generated constructor: references and
/// const non-static values.
fn field_blocks_implicit_construction(field: &MetaField) -> bool {
    if field.is_static {
        return false;
    }
    field.ty.reference() != cxxbind_ast::ReferenceKind::None
        || (field.ty.is_constant() && field.ty.indirections().is_empty())
}

impl ClassArena {
    /// Transitive "the compiler would generate a default constructor"
    /// check: every field initializable, every base independently
    /// default constructible.
    ///
    /// Recomputed on demand; the fix-up passes mutate fields and
    /// bases, so the answer is never cached.
    pub fn is_implicitly_default_constructible(&self, id: ClassId) -> bool {
        let class = self.get(id);
        class
            .fields
            .iter()
            .all(|f| !field_blocks_implicit_construction(f))
            && class
                .base_classes
                .iter()
                .all(|&b| self.is_default_constructible(b))
    }

    pub fn is_default_constructible(&self, id: ClassId) -> bool {
        let class = self.get(id);
        let mut ctors = class.declared_constructors().peekable();
        if ctors.peek().is_some() {
            return ctors.any(|f| {
                !f.is_private() && !f.is_copy_constructor() && f.required_argument_count() == 0
            });
        }
        self.is_implicitly_default_constructible(id)
    }

    pub fn is_copy_constructible(&self, id: ClassId) -> bool {
        let class = self.get(id);
        if class.has_copy_constructor() {
            return !class.has_private_copy_constructor();
        }
        class
            .fields
            .iter()
            .all(|f| !field_blocks_implicit_construction(f))
            && class
                .base_classes
                .iter()
                .all(|&b| self.is_copy_constructible(b))
    }

    fn can_add_constructor_helper(&self, id: ClassId, db: &TypeDatabase) -> bool {
        let class = self.get(id);
        !class.is_namespace()
            && db.entry(class.type_entry).allow_default_constructor
            && !class
                .attributes
                .contains(ClassAttributes::HAS_REJECTED_CONSTRUCTOR)
            && !class.has_private_destructor()
    }

    /// May the builder synthesize a public default constructor?
    pub fn can_add_default_constructor(&self, id: ClassId, db: &TypeDatabase) -> bool {
        let class = self.get(id);
        self.can_add_constructor_helper(id, db)
            && !class.has_constructors()
            && self.is_implicitly_default_constructible(id)
    }

    /// May the builder synthesize a public copy constructor?
    ///
    /// A private copy constructor declared in the header is a hard
    /// veto: the class is not copyable no matter what the rules ask.
    pub fn can_add_default_copy_constructor(&self, id: ClassId, db: &TypeDatabase) -> bool {
        let class = self.get(id);
        if !class.is_namespace()
            && db.entry(class.type_entry).allow_default_copy_constructor
            && !class
                .attributes
                .contains(ClassAttributes::HAS_REJECTED_CONSTRUCTOR)
            && !class.has_private_destructor()
            && !class.has_copy_constructor()
        {
            self.is_copy_constructible(id)
        } else {
            false
        }
    }

    /// Virtual anywhere in the hierarchy makes the class polymorphic.
    pub fn is_polymorphic(&self, id: ClassId) -> bool {
        self.get(id).has_virtual_functions()
            || self
                .get(id)
                .base_classes
                .iter()
                .any(|&b| self.is_polymorphic(b))
    }

    /// Synthesize a public default constructor record for `id`.
    pub fn make_synthesized_default_constructor(
        &self,
        id: ClassId,
        void_type: MetaType,
    ) -> MetaFunction {
        let class = self.get(id);
        let mut f = MetaFunction::new(class.name.clone(), FunctionKind::Constructor, void_type);
        f.attributes.insert(FunctionAttributes::SYNTHESIZED);
        f.owner = Some(id);
        f.implementing_class = Some(id);
        f.declaring_class = Some(id);
        f
    }
}
