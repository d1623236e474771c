use cxxbind_ast::{Access, EnumKind, EnumValueNumber};
use cxxbind_typesystem::TypeEntryId;
use smol_str::SmolStr;

use crate::arena::ClassId;

/// A resolved enumerator.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaEnumValue {
    pub name: SmolStr,
    pub value: EnumValueNumber,
    /// The spelled expression, kept for documentation and default
    /// value rewriting.
    pub string_value: SmolStr,
    pub is_deprecated: bool,
    pub documentation: SmolStr,
}

impl MetaEnumValue {
    pub fn new(name: impl Into<SmolStr>, value: EnumValueNumber) -> Self {
        Self {
            name: name.into(),
            value,
            string_value: SmolStr::default(),
            is_deprecated: false,
            documentation: SmolStr::default(),
        }
    }
}

/// A resolved enum.
///
/// The enclosing class is a weak back-reference used for scope lookup
/// only; `None` for namespace-level enums hosted on the invisible
/// global scope.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaEnum {
    pub type_entry: TypeEntryId,
    pub name: SmolStr,
    pub qualified_name: SmolStr,
    pub kind: EnumKind,
    pub access: Access,
    pub values: Vec<MetaEnumValue>,
    pub enclosing_class: Option<ClassId>,
    /// The flags entry wrapping this enum, when the rules declare one.
    pub flags_entry: Option<TypeEntryId>,
    pub is_deprecated: bool,
    /// Value space of the underlying type. Unsigned when the
    /// underlying type says so or a value exceeds `i64`.
    pub is_signed: bool,
    pub documentation: SmolStr,
}

impl MetaEnum {
    pub fn is_anonymous(&self) -> bool {
        self.kind == EnumKind::Anonymous
    }

    pub fn has_flags(&self) -> bool {
        self.flags_entry.is_some()
    }

    pub fn find_value(&self, name: &str) -> Option<&MetaEnumValue> {
        self.values.iter().find(|v| v.name == name)
    }

    /// Determine signedness from the declared values: any negative
    /// value forces signed, any value above `i64::MAX` forces
    /// unsigned. Both at once is a malformed input the upstream
    /// parser cannot produce.
    pub fn deduce_signedness(values: &[MetaEnumValue], underlying_unsigned: bool) -> bool {
        if values.iter().any(|v| v.value.is_negative()) {
            return true;
        }
        if values
            .iter()
            .any(|v| matches!(v.value, EnumValueNumber::Unsigned(_)))
        {
            return false;
        }
        !underlying_unsigned
    }
}
