use cxxbind_ast::Access;
use cxxbind_typesystem::{CodeSnippet, TypeDatabase};
use smol_str::SmolStr;

use crate::arena::ClassId;
use crate::argument::MetaArgument;
use crate::types::MetaType;

/// What kind of callable a function record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Constructor,
    CopyConstructor,
    MoveConstructor,
    AssignmentOperator,
    Destructor,
    Normal,
    Signal,
    Slot,
    ConversionOperator,
    ArithmeticOperator,
    BitwiseOperator,
    LogicalOperator,
    ShiftOperator,
    SubscriptOperator,
    CallOperator,
    ComparisonOperator,
    /// Body-less stand-in: a private override of an abstract method
    /// forced into the class so it stays concrete.
    Empty,
}

impl FunctionKind {
    pub fn is_constructor(self) -> bool {
        matches!(
            self,
            Self::Constructor | Self::CopyConstructor | Self::MoveConstructor
        )
    }

    pub fn is_operator(self) -> bool {
        matches!(
            self,
            Self::AssignmentOperator
                | Self::ConversionOperator
                | Self::ArithmeticOperator
                | Self::BitwiseOperator
                | Self::LogicalOperator
                | Self::ShiftOperator
                | Self::SubscriptOperator
                | Self::CallOperator
                | Self::ComparisonOperator
        )
    }
}

/// Attribute bitmask for functions.
///
/// Kept as a plain `u32` wrapper so copies are cheap and sets compare
/// by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct FunctionAttributes(u32);

impl FunctionAttributes {
    pub const ABSTRACT: Self = Self(1 << 0);
    pub const VIRTUAL: Self = Self(1 << 1);
    pub const OVERRIDE: Self = Self(1 << 2);
    pub const FINAL_IN_TARGET_LANG: Self = Self(1 << 3);
    pub const STATIC: Self = Self(1 << 4);
    pub const EXPLICIT: Self = Self(1 << 5);
    pub const DEPRECATED: Self = Self(1 << 6);
    /// Declared by a rule, not by the C++ header.
    pub const USER_ADDED: Self = Self(1 << 7);
    /// Copied down from a base class by the fix-up pass.
    pub const ADDED_BY_PROPAGATION: Self = Self(1 << 8);
    /// Synthesized default/copy constructor.
    pub const SYNTHESIZED: Self = Self(1 << 9);
    pub const DEFAULTED: Self = Self(1 << 10);
    pub const INVALID: Self = Self(1 << 11);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Result mask of [`MetaFunction::compare_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompareResult(u32);

impl CompareResult {
    pub const EQUAL_NAME: Self = Self(1 << 0);
    pub const EQUAL_MODIFIED_NAME: Self = Self(1 << 1);
    pub const EQUAL_ARGUMENTS: Self = Self(1 << 2);
    pub const EQUAL_ATTRIBUTES: Self = Self(1 << 3);
    pub const EQUAL_ACCESS: Self = Self(1 << 4);
    /// One argument list extends the other purely with defaulted
    /// arguments, making the shorter one a call-compatible overload.
    pub const EQUAL_DEFAULT_VALUE_OVERLOAD: Self = Self(1 << 5);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

/// A resolved function or method.
///
/// `owner` is the class currently listing the function,
/// `implementing_class` the class providing the implementation, and
/// `declaring_class` the class that first introduced the virtual.
/// The three differ exactly when the fix-up pass propagates inherited
/// functions down multi-level hierarchies.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaFunction {
    pub name: SmolStr,
    pub original_name: SmolStr,
    pub kind: FunctionKind,
    pub return_type: MetaType,
    pub modified_return_type: Option<MetaType>,
    pub arguments: Vec<MetaArgument>,
    pub attributes: FunctionAttributes,
    pub access: Access,
    pub original_access: Access,
    pub is_constant: bool,
    pub owner: Option<ClassId>,
    pub implementing_class: Option<ClassId>,
    pub declaring_class: Option<ClassId>,
    /// Dropped from the output by a rule; kept for diagnostics.
    pub modified_removed: bool,
    pub code_snippets: Vec<CodeSnippet>,
    pub documentation: SmolStr,
}

impl MetaFunction {
    pub fn new(name: impl Into<SmolStr>, kind: FunctionKind, return_type: MetaType) -> Self {
        let name = name.into();
        Self {
            original_name: name.clone(),
            name,
            kind,
            return_type,
            modified_return_type: None,
            arguments: Vec::new(),
            attributes: FunctionAttributes::default(),
            access: Access::Public,
            original_access: Access::Public,
            is_constant: false,
            owner: None,
            implementing_class: None,
            declaring_class: None,
            modified_removed: false,
            code_snippets: Vec::new(),
            documentation: SmolStr::default(),
        }
    }

    pub fn is_constructor(&self) -> bool {
        self.kind.is_constructor()
    }

    pub fn is_copy_constructor(&self) -> bool {
        self.kind == FunctionKind::CopyConstructor
    }

    pub fn is_destructor(&self) -> bool {
        self.kind == FunctionKind::Destructor
    }

    pub fn is_operator(&self) -> bool {
        self.kind.is_operator()
    }

    pub fn is_comparison_operator(&self) -> bool {
        self.kind == FunctionKind::ComparisonOperator
    }

    pub fn is_signal(&self) -> bool {
        self.kind == FunctionKind::Signal
    }

    pub fn is_empty_function(&self) -> bool {
        self.kind == FunctionKind::Empty
    }

    pub fn is_abstract(&self) -> bool {
        self.attributes.contains(FunctionAttributes::ABSTRACT)
    }

    pub fn is_virtual(&self) -> bool {
        self.attributes.contains(FunctionAttributes::VIRTUAL)
    }

    pub fn is_static(&self) -> bool {
        self.attributes.contains(FunctionAttributes::STATIC)
    }

    pub fn is_final_in_target_lang(&self) -> bool {
        self.attributes
            .contains(FunctionAttributes::FINAL_IN_TARGET_LANG)
    }

    pub fn is_user_added(&self) -> bool {
        self.attributes.contains(FunctionAttributes::USER_ADDED)
    }

    pub fn is_propagated(&self) -> bool {
        self.attributes
            .contains(FunctionAttributes::ADDED_BY_PROPAGATION)
    }

    pub fn is_invalid(&self) -> bool {
        self.attributes.contains(FunctionAttributes::INVALID)
    }

    pub fn is_private(&self) -> bool {
        self.access == Access::Private
    }

    pub fn is_renamed(&self) -> bool {
        self.name != self.original_name
    }

    pub fn effective_return_type(&self) -> &MetaType {
        self.modified_return_type.as_ref().unwrap_or(&self.return_type)
    }

    /// Post-modification argument types: removed arguments are
    /// dropped, replaced types win. This is the list dispatch and
    /// override matching run on.
    pub fn effective_argument_types(&self) -> Vec<&MetaType> {
        self.arguments
            .iter()
            .filter(|a| !a.removed)
            .map(MetaArgument::effective_type)
            .collect()
    }

    /// Number of arguments a caller must supply.
    pub fn required_argument_count(&self) -> usize {
        self.arguments
            .iter()
            .filter(|a| !a.removed && !a.has_default_value())
            .count()
    }

    /// Full signature with qualifiers, for logs.
    pub fn signature(&self, db: &TypeDatabase) -> String {
        let mut s = String::from(self.original_name.as_str());
        s.push('(');
        for (i, arg) in self.arguments.iter().enumerate() {
            if i > 0 {
                s.push_str(", ");
            }
            s.push_str(&arg.ty.to_type_string(db));
        }
        s.push(')');
        if self.is_constant {
            s.push_str(" const");
        }
        s
    }

    /// Canonical signature used as modification key and rejection
    /// sort key: original name plus cv/ref-stripped argument types,
    /// no spaces.
    pub fn minimal_signature(&self, db: &TypeDatabase) -> String {
        let mut s = String::from(self.original_name.as_str());
        s.push('(');
        for (i, arg) in self.arguments.iter().enumerate() {
            if i > 0 {
                s.push(',');
            }
            s.push_str(&arg.ty.minimal_signature(db));
        }
        s.push(')');
        s
    }

    /// Compare against a base-class candidate for override matching.
    pub fn compare_to(&self, other: &MetaFunction) -> CompareResult {
        let mut result = CompareResult::default();
        if self.original_name == other.original_name {
            result.insert(CompareResult::EQUAL_NAME);
        }
        if self.name == other.name {
            result.insert(CompareResult::EQUAL_MODIFIED_NAME);
        }
        if self.attributes == other.attributes {
            result.insert(CompareResult::EQUAL_ATTRIBUTES);
        }
        if self.access == other.access {
            result.insert(CompareResult::EQUAL_ACCESS);
        }

        let mine = self.effective_argument_types();
        let theirs = other.effective_argument_types();
        if mine.len() == theirs.len() {
            if mine == theirs {
                result.insert(CompareResult::EQUAL_ARGUMENTS);
            }
        } else if result.contains(CompareResult::EQUAL_MODIFIED_NAME) {
            let (shorter, longer, longer_fn) = if mine.len() < theirs.len() {
                (&mine, &theirs, other)
            } else {
                (&theirs, &mine, self)
            };
            let prefix_equal = shorter.iter().zip(longer.iter()).all(|(a, b)| a == b);
            if prefix_equal {
                let live: Vec<&MetaArgument> =
                    longer_fn.arguments.iter().filter(|a| !a.removed).collect();
                let tail_defaulted = live[shorter.len()..]
                    .iter()
                    .all(|a| a.has_default_value());
                if tail_defaulted {
                    result.insert(CompareResult::EQUAL_DEFAULT_VALUE_OVERLOAD);
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cxxbind_typesystem::{TypeDatabaseBuilder, TypeEntry};

    fn db() -> TypeDatabase {
        let mut b = TypeDatabaseBuilder::new();
        b.push(TypeEntry::void());
        b.push(TypeEntry::primitive("int"));
        b.push(TypeEntry::primitive("double"));
        b.push(TypeEntry::value("Foo"));
        b.freeze()
    }

    fn ty(db: &TypeDatabase, name: &str) -> MetaType {
        let mut t = MetaType::new(db.find_type(name).unwrap());
        t.decide_usage_pattern(db);
        t
    }

    fn void_fn(db: &TypeDatabase, name: &str) -> MetaFunction {
        MetaFunction::new(name, FunctionKind::Normal, ty(db, "void"))
    }

    #[test]
    fn attribute_mask_ops() {
        let mut a = FunctionAttributes::default();
        assert!(a.is_empty());
        a.insert(FunctionAttributes::VIRTUAL);
        a.insert(FunctionAttributes::ABSTRACT);
        assert!(a.contains(FunctionAttributes::VIRTUAL));
        assert!(a.contains(FunctionAttributes::ABSTRACT));
        a.remove(FunctionAttributes::ABSTRACT);
        assert!(!a.contains(FunctionAttributes::ABSTRACT));
        assert!(a.contains(FunctionAttributes::VIRTUAL));
    }

    #[test]
    fn signatures() {
        let db = db();
        let mut f = void_fn(&db, "resize");
        f.arguments.push(MetaArgument::new("w", ty(&db, "int"), 0));
        let mut h = ty(&db, "Foo");
        h.set_constant(true);
        h.set_reference(cxxbind_ast::ReferenceKind::LValue);
        h.decide_usage_pattern(&db);
        f.arguments.push(MetaArgument::new("hint", h, 1));
        f.is_constant = true;

        assert_eq!(f.signature(&db), "resize(int, const Foo&) const");
        assert_eq!(f.minimal_signature(&db), "resize(int,Foo)");
    }

    #[test]
    fn compare_equal_signature() {
        let db = db();
        let mut a = void_fn(&db, "f");
        a.arguments.push(MetaArgument::new("x", ty(&db, "int"), 0));
        let mut b = void_fn(&db, "f");
        b.arguments.push(MetaArgument::new("y", ty(&db, "int"), 0));

        let cmp = a.compare_to(&b);
        assert!(cmp.contains(CompareResult::EQUAL_NAME));
        assert!(cmp.contains(CompareResult::EQUAL_MODIFIED_NAME));
        assert!(cmp.contains(CompareResult::EQUAL_ARGUMENTS));
    }

    #[test]
    fn compare_uses_effective_types() {
        let db = db();
        // Base takes (int, double); derived's rule removed the double.
        let mut base = void_fn(&db, "f");
        base.arguments.push(MetaArgument::new("x", ty(&db, "int"), 0));
        let mut derived = void_fn(&db, "f");
        derived.arguments.push(MetaArgument::new("x", ty(&db, "int"), 0));
        let mut removed = MetaArgument::new("y", ty(&db, "double"), 1);
        removed.removed = true;
        derived.arguments.push(removed);

        let cmp = derived.compare_to(&base);
        assert!(cmp.contains(CompareResult::EQUAL_ARGUMENTS));
    }

    #[test]
    fn compare_type_modification_breaks_match() {
        let db = db();
        let mut a = void_fn(&db, "f");
        a.arguments.push(MetaArgument::new("x", ty(&db, "int"), 0));
        let mut b = void_fn(&db, "f");
        let mut arg = MetaArgument::new("x", ty(&db, "int"), 0);
        arg.modified_ty = Some(ty(&db, "double"));
        b.arguments.push(arg);

        let cmp = a.compare_to(&b);
        assert!(cmp.contains(CompareResult::EQUAL_MODIFIED_NAME));
        assert!(!cmp.contains(CompareResult::EQUAL_ARGUMENTS));
    }

    #[test]
    fn compare_default_value_overload() {
        let db = db();
        let mut short = void_fn(&db, "f");
        short.arguments.push(MetaArgument::new("x", ty(&db, "int"), 0));
        let mut long = void_fn(&db, "f");
        long.arguments.push(MetaArgument::new("x", ty(&db, "int"), 0));
        let mut tail = MetaArgument::new("y", ty(&db, "double"), 1);
        tail.default_value = Some("1.0".into());
        long.arguments.push(tail);

        let cmp = short.compare_to(&long);
        assert!(cmp.contains(CompareResult::EQUAL_DEFAULT_VALUE_OVERLOAD));
        assert!(!cmp.contains(CompareResult::EQUAL_ARGUMENTS));
    }

    #[test]
    fn compare_rename_breaks_modified_name() {
        let db = db();
        let a = void_fn(&db, "f");
        let mut b = void_fn(&db, "f");
        b.name = "f_renamed".into();

        let cmp = a.compare_to(&b);
        assert!(cmp.contains(CompareResult::EQUAL_NAME));
        assert!(!cmp.contains(CompareResult::EQUAL_MODIFIED_NAME));
    }

    #[test]
    fn required_argument_count_skips_defaults_and_removed() {
        let db = db();
        let mut f = void_fn(&db, "f");
        f.arguments.push(MetaArgument::new("a", ty(&db, "int"), 0));
        let mut b = MetaArgument::new("b", ty(&db, "int"), 1);
        b.default_value = Some("0".into());
        f.arguments.push(b);
        let mut c = MetaArgument::new("c", ty(&db, "int"), 2);
        c.removed = true;
        f.arguments.push(c);
        assert_eq!(f.required_argument_count(), 1);
    }
}
