use cxxbind_ast::{ArrayBound, Indirection, ReferenceKind};
use cxxbind_typesystem::{TypeDatabase, TypeEntryId, TypeEntryKind};
use smallvec::SmallVec;
use smol_str::SmolStr;

/// How a resolved type is used at a signature position.
///
/// Always derivable from the other `MetaType` fields; see
/// [`MetaType::decide_usage_pattern`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeUsagePattern {
    Primitive,
    Enum,
    Flags,
    /// Copyable class used by value or by const reference.
    Value,
    /// Value class behind exactly one pointer.
    ValuePointer,
    /// Identity class behind pointer or reference.
    Object,
    Container,
    SmartPointer,
    Array,
    /// Anything passed as a raw pointer the target language cannot
    /// model more precisely.
    NativePointer,
    Void,
    Varargs,
    TemplateArgument,
}

/// A resolved C++ type usage.
///
/// Equality is over the determining tuple (entry, indirections,
/// reference, constness, array bounds, instantiations); the usage
/// pattern and original spelling are derived/diagnostic data and do
/// not participate.
#[derive(Debug, Clone)]
pub struct MetaType {
    entry: TypeEntryId,
    indirections: SmallVec<[Indirection; 2]>,
    reference: ReferenceKind,
    constant: bool,
    volatile_: bool,
    array_bounds: Vec<ArrayBound>,
    /// Unknown-bound C array degraded to a pointer; kept so bindings
    /// can still tell the parameter was an array.
    degraded_from_array: bool,
    instantiations: Vec<MetaType>,
    original_description: SmolStr,
    pattern: TypeUsagePattern,
}

impl PartialEq for MetaType {
    fn eq(&self, other: &Self) -> bool {
        self.entry == other.entry
            && self.indirections == other.indirections
            && self.reference == other.reference
            && self.constant == other.constant
            && self.volatile_ == other.volatile_
            && self.array_bounds == other.array_bounds
            && self.instantiations == other.instantiations
    }
}

impl Eq for MetaType {}

impl MetaType {
    pub fn new(entry: TypeEntryId) -> Self {
        Self {
            entry,
            indirections: SmallVec::new(),
            reference: ReferenceKind::None,
            constant: false,
            volatile_: false,
            array_bounds: Vec::new(),
            degraded_from_array: false,
            instantiations: Vec::new(),
            original_description: SmolStr::default(),
            pattern: TypeUsagePattern::Void,
        }
    }

    pub fn entry(&self) -> TypeEntryId {
        self.entry
    }

    pub fn indirections(&self) -> &[Indirection] {
        &self.indirections
    }

    pub fn reference(&self) -> ReferenceKind {
        self.reference
    }

    pub fn is_constant(&self) -> bool {
        self.constant
    }

    pub fn is_volatile(&self) -> bool {
        self.volatile_
    }

    pub fn array_bounds(&self) -> &[ArrayBound] {
        &self.array_bounds
    }

    pub fn is_degraded_from_array(&self) -> bool {
        self.degraded_from_array
    }

    pub fn instantiations(&self) -> &[MetaType] {
        &self.instantiations
    }

    pub fn original_description(&self) -> &str {
        &self.original_description
    }

    pub fn usage_pattern(&self) -> TypeUsagePattern {
        self.pattern
    }

    pub fn set_indirections(&mut self, indirections: SmallVec<[Indirection; 2]>) {
        self.indirections = indirections;
    }

    pub fn add_indirection(&mut self, level: Indirection) {
        self.indirections.push(level);
    }

    pub fn set_reference(&mut self, reference: ReferenceKind) {
        self.reference = reference;
    }

    pub fn set_constant(&mut self, constant: bool) {
        self.constant = constant;
    }

    pub fn set_volatile(&mut self, volatile_: bool) {
        self.volatile_ = volatile_;
    }

    pub fn set_array_bounds(&mut self, bounds: Vec<ArrayBound>) {
        self.array_bounds = bounds;
    }

    pub fn set_degraded_from_array(&mut self, degraded: bool) {
        self.degraded_from_array = degraded;
    }

    pub fn set_instantiations(&mut self, instantiations: Vec<MetaType>) {
        self.instantiations = instantiations;
    }

    pub fn set_original_description(&mut self, description: impl Into<SmolStr>) {
        self.original_description = description.into();
    }

    /// `const T &` with no pointers: passed by const reference.
    pub fn pass_by_const_ref(&self) -> bool {
        self.constant && self.reference == ReferenceKind::LValue && self.indirections.is_empty()
    }

    pub fn is_void(&self) -> bool {
        self.pattern == TypeUsagePattern::Void
    }

    pub fn is_pointer(&self) -> bool {
        !self.indirections.is_empty()
    }

    /// Re-derive the usage pattern from the determining fields.
    ///
    /// Call after any mutation; construction helpers in the resolver
    /// always finish with this.
    pub fn decide_usage_pattern(&mut self, db: &TypeDatabase) {
        self.pattern = self.determine_usage_pattern(db);
    }

    fn determine_usage_pattern(&self, db: &TypeDatabase) -> TypeUsagePattern {
        let entry = db.entry(self.entry);
        if entry.is_template_argument() {
            return TypeUsagePattern::TemplateArgument;
        }
        if !self.array_bounds.is_empty() {
            return TypeUsagePattern::Array;
        }
        if entry.is_primitive() && (self.indirections.is_empty() || self.pass_by_const_ref()) {
            return TypeUsagePattern::Primitive;
        }
        if entry.is_void() {
            return if self.indirections.is_empty()
                && self.reference == ReferenceKind::None
                && !self.constant
                && !self.volatile_
            {
                TypeUsagePattern::Void
            } else {
                TypeUsagePattern::NativePointer
            };
        }
        if entry.is_varargs() {
            return TypeUsagePattern::Varargs;
        }
        if entry.is_enum() && (self.indirections.is_empty() || self.pass_by_const_ref()) {
            return TypeUsagePattern::Enum;
        }
        if entry.is_object() {
            return if self.indirections.is_empty() && self.reference == ReferenceKind::None {
                TypeUsagePattern::Value
            } else {
                TypeUsagePattern::Object
            };
        }
        if entry.is_container() && self.indirections.is_empty() {
            return TypeUsagePattern::Container;
        }
        if entry.is_smart_pointer() && self.indirections.is_empty() {
            return TypeUsagePattern::SmartPointer;
        }
        if entry.is_flags() && (self.indirections.is_empty() || self.pass_by_const_ref()) {
            return TypeUsagePattern::Flags;
        }
        if entry.is_value() {
            return if self.indirections.len() == 1 {
                TypeUsagePattern::ValuePointer
            } else if self.indirections.is_empty() {
                TypeUsagePattern::Value
            } else {
                TypeUsagePattern::NativePointer
            };
        }
        TypeUsagePattern::NativePointer
    }

    /// Any instantiation argument, recursively, that is still an
    /// unbound template parameter?
    pub fn has_template_children(&self, db: &TypeDatabase) -> bool {
        self.instantiations.iter().any(|t| {
            db.entry(t.entry).is_template_argument() || t.has_template_children(db)
        })
    }

    /// Strip top-level cv/reference of this type and, recursively, of
    /// every instantiation argument.
    ///
    /// The result is the container de-duplication key: `const
    /// List<const Foo> &` and `List<Foo>` canonicalize identically.
    /// Idempotent.
    #[must_use]
    pub fn canonicalized(&self, db: &TypeDatabase) -> MetaType {
        let mut out = self.clone();
        out.constant = false;
        out.volatile_ = false;
        out.reference = ReferenceKind::None;
        out.indirections.clear();
        out.instantiations = self
            .instantiations
            .iter()
            .map(|t| t.canonicalized(db))
            .collect();
        out.decide_usage_pattern(db);
        out
    }

    /// Canonical form for a smart-pointer instantiation: strip the
    /// pointer's own cv/reference and the pointee's constness, leaving
    /// the pointee otherwise intact.
    #[must_use]
    pub fn canonical_smart_pointer(&self, db: &TypeDatabase) -> MetaType {
        let mut out = self.clone();
        out.constant = false;
        out.reference = ReferenceKind::None;
        if let Some(pointee) = out.instantiations.first_mut() {
            pointee.constant = false;
            pointee.decide_usage_pattern(db);
        }
        out.decide_usage_pattern(db);
        out
    }

    /// Render the C++ spelling of this type from its resolved entry.
    pub fn to_type_string(&self, db: &TypeDatabase) -> String {
        let mut s = String::new();
        if self.constant {
            s.push_str("const ");
        }
        if self.volatile_ {
            s.push_str("volatile ");
        }
        s.push_str(&db.entry(self.entry).qualified_name);
        if !self.instantiations.is_empty() {
            s.push('<');
            for (i, t) in self.instantiations.iter().enumerate() {
                if i > 0 {
                    s.push_str(", ");
                }
                s.push_str(&t.to_type_string(db));
            }
            s.push('>');
        }
        for ind in &self.indirections {
            match ind {
                Indirection::Pointer => s.push('*'),
                Indirection::ConstPointer => s.push_str("*const"),
            }
        }
        match self.reference {
            ReferenceKind::None => {}
            ReferenceKind::LValue => s.push('&'),
            ReferenceKind::RValue => s.push_str("&&"),
        }
        for bound in &self.array_bounds {
            match bound {
                ArrayBound::Known(n) => {
                    s.push('[');
                    s.push_str(&n.to_string());
                    s.push(']');
                }
                ArrayBound::Unknown => s.push_str("[]"),
            }
        }
        s
    }

    /// De-duplication key for instantiated containers/smart pointers.
    pub fn canonical_signature(&self, db: &TypeDatabase) -> String {
        let canonical = match db.entry(self.entry).kind {
            TypeEntryKind::SmartPointer { .. } => self.canonical_smart_pointer(db),
            _ => self.canonicalized(db),
        };
        canonical.to_type_string(db)
    }

    /// Signature fragment with cv/reference stripped but pointer
    /// levels kept; used in minimal function signatures.
    pub fn minimal_signature(&self, db: &TypeDatabase) -> String {
        let mut out = self.clone();
        out.constant = false;
        out.volatile_ = false;
        out.reference = ReferenceKind::None;
        out.to_type_string(db)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cxxbind_typesystem::{ContainerKind, SmartPointerKind, TypeDatabaseBuilder, TypeEntry};

    fn db() -> TypeDatabase {
        let mut b = TypeDatabaseBuilder::new();
        b.push(TypeEntry::primitive("int"));
        b.push(TypeEntry::value("Foo"));
        b.push(TypeEntry::object("Node"));
        b.push(TypeEntry::enum_type("Color"));
        b.push(TypeEntry::container("List", ContainerKind::Sequence));
        b.push(TypeEntry::smart_pointer("SharedPtr", SmartPointerKind::Shared));
        b.push(TypeEntry::void());
        b.push(TypeEntry::template_argument("T", 0));
        b.freeze()
    }

    fn ty(db: &TypeDatabase, name: &str) -> MetaType {
        let mut t = MetaType::new(db.find_type(name).unwrap());
        t.decide_usage_pattern(db);
        t
    }

    #[test]
    fn primitive_pattern() {
        let db = db();
        assert_eq!(ty(&db, "int").usage_pattern(), TypeUsagePattern::Primitive);
    }

    #[test]
    fn primitive_pointer_is_native() {
        let db = db();
        let mut t = ty(&db, "int");
        t.add_indirection(Indirection::Pointer);
        t.decide_usage_pattern(&db);
        assert_eq!(t.usage_pattern(), TypeUsagePattern::NativePointer);
    }

    #[test]
    fn value_patterns() {
        let db = db();
        let mut t = ty(&db, "Foo");
        assert_eq!(t.usage_pattern(), TypeUsagePattern::Value);
        t.add_indirection(Indirection::Pointer);
        t.decide_usage_pattern(&db);
        assert_eq!(t.usage_pattern(), TypeUsagePattern::ValuePointer);
        t.add_indirection(Indirection::Pointer);
        t.decide_usage_pattern(&db);
        assert_eq!(t.usage_pattern(), TypeUsagePattern::NativePointer);
    }

    #[test]
    fn object_patterns() {
        let db = db();
        let mut t = ty(&db, "Node");
        assert_eq!(t.usage_pattern(), TypeUsagePattern::Value);
        t.add_indirection(Indirection::Pointer);
        t.decide_usage_pattern(&db);
        assert_eq!(t.usage_pattern(), TypeUsagePattern::Object);
    }

    #[test]
    fn enum_by_const_ref_stays_enum() {
        let db = db();
        let mut t = ty(&db, "Color");
        t.set_constant(true);
        t.set_reference(ReferenceKind::LValue);
        t.decide_usage_pattern(&db);
        assert_eq!(t.usage_pattern(), TypeUsagePattern::Enum);
    }

    #[test]
    fn void_patterns() {
        let db = db();
        let mut t = ty(&db, "void");
        assert_eq!(t.usage_pattern(), TypeUsagePattern::Void);
        assert!(t.is_void());
        t.add_indirection(Indirection::Pointer);
        t.decide_usage_pattern(&db);
        assert_eq!(t.usage_pattern(), TypeUsagePattern::NativePointer);
        assert!(!t.is_void());
    }

    #[test]
    fn array_pattern_wins() {
        let db = db();
        let mut t = ty(&db, "int");
        t.set_array_bounds(vec![ArrayBound::Known(4)]);
        t.decide_usage_pattern(&db);
        assert_eq!(t.usage_pattern(), TypeUsagePattern::Array);
    }

    #[test]
    fn container_and_smart_pointer_patterns() {
        let db = db();
        let mut list = ty(&db, "List");
        list.set_instantiations(vec![ty(&db, "int")]);
        list.decide_usage_pattern(&db);
        assert_eq!(list.usage_pattern(), TypeUsagePattern::Container);

        let mut ptr = ty(&db, "SharedPtr");
        ptr.set_instantiations(vec![ty(&db, "Foo")]);
        ptr.decide_usage_pattern(&db);
        assert_eq!(ptr.usage_pattern(), TypeUsagePattern::SmartPointer);
    }

    #[test]
    fn equality_ignores_derived_pattern() {
        let db = db();
        let a = ty(&db, "Foo");
        let mut b = MetaType::new(db.find_type("Foo").unwrap());
        b.set_original_description("something else entirely");
        // b's pattern was never decided; equality must not care.
        assert_eq!(a, b);
    }

    #[test]
    fn construction_order_irrelevant() {
        let db = db();
        let mut a = MetaType::new(db.find_type("List").unwrap());
        a.set_constant(true);
        a.set_instantiations(vec![ty(&db, "int")]);
        a.decide_usage_pattern(&db);

        let mut b = MetaType::new(db.find_type("List").unwrap());
        b.set_instantiations(vec![ty(&db, "int")]);
        b.set_constant(true);
        b.decide_usage_pattern(&db);
        assert_eq!(a, b);
    }

    #[test]
    fn inequality_on_qualifiers() {
        let db = db();
        let a = ty(&db, "Foo");
        let mut b = ty(&db, "Foo");
        b.set_constant(true);
        assert_ne!(a, b);
    }

    #[test]
    fn canonical_container_strips_cv_ref() {
        let db = db();
        let mut inner = ty(&db, "Foo");
        inner.set_constant(true);
        let mut t = ty(&db, "List");
        t.set_constant(true);
        t.set_reference(ReferenceKind::LValue);
        t.set_instantiations(vec![inner]);
        t.decide_usage_pattern(&db);

        let mut plain = ty(&db, "List");
        plain.set_instantiations(vec![ty(&db, "Foo")]);
        plain.decide_usage_pattern(&db);

        assert_eq!(t.canonicalized(&db), plain);
        assert_eq!(t.canonical_signature(&db), "List<Foo>");
    }

    #[test]
    fn canonical_is_idempotent() {
        let db = db();
        let mut t = ty(&db, "List");
        t.set_constant(true);
        t.set_reference(ReferenceKind::LValue);
        t.set_instantiations(vec![ty(&db, "int")]);
        t.decide_usage_pattern(&db);
        let once = t.canonicalized(&db);
        let twice = once.canonicalized(&db);
        assert_eq!(once, twice);
    }

    #[test]
    fn canonical_smart_pointer_keeps_pointee_identity() {
        let db = db();
        let mut pointee = ty(&db, "Foo");
        pointee.set_constant(true);
        let mut t = ty(&db, "SharedPtr");
        t.set_constant(true);
        t.set_reference(ReferenceKind::LValue);
        t.set_instantiations(vec![pointee]);
        t.decide_usage_pattern(&db);

        let canon = t.canonical_smart_pointer(&db);
        assert!(!canon.is_constant());
        assert_eq!(canon.reference(), ReferenceKind::None);
        assert!(!canon.instantiations()[0].is_constant());
        assert_eq!(canon.canonical_signature(&db), "SharedPtr<Foo>");
    }

    #[test]
    fn template_children_detection() {
        let db = db();
        let mut t = ty(&db, "List");
        t.set_instantiations(vec![ty(&db, "T")]);
        assert!(t.has_template_children(&db));

        let mut nested = ty(&db, "List");
        let mut inner = ty(&db, "List");
        inner.set_instantiations(vec![ty(&db, "T")]);
        nested.set_instantiations(vec![inner]);
        assert!(nested.has_template_children(&db));

        let mut bound = ty(&db, "List");
        bound.set_instantiations(vec![ty(&db, "int")]);
        assert!(!bound.has_template_children(&db));
    }

    #[test]
    fn type_string_rendering() {
        let db = db();
        let mut t = ty(&db, "List");
        t.set_constant(true);
        t.set_reference(ReferenceKind::LValue);
        t.set_instantiations(vec![ty(&db, "int")]);
        assert_eq!(t.to_type_string(&db), "const List<int>&");
        assert_eq!(t.minimal_signature(&db), "List<int>");
    }
}
