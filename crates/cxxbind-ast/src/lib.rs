mod item;
mod type_info;

pub use item::{
    ArgumentItem, BaseSpecifier, ClassItem, ClassKind, CodeModel, EnumItem, EnumKind,
    EnumValueNumber, EnumeratorItem, FunctionItem, ItemId, NamespaceItem, TemplateParameterItem,
    TypedefItem, UsingItem, VariableItem,
};
pub use type_info::{ArrayBound, Indirection, ReferenceKind, TypeInfo};

use smol_str::SmolStr;

/// Member access specifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Access {
    Private,
    Protected,
    Public,
}

impl Access {
    pub fn keyword_str(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Protected => "protected",
            Self::Public => "public",
        }
    }
}

/// A C++ name: either a single identifier or a `::`-qualified path.
///
/// Segments never contain `::`. Template argument text is not part of
/// a `NamePath`; it lives in [`TypeInfo::template_args`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamePath {
    segments: Box<[SmolStr]>,
}

impl NamePath {
    pub fn new(segments: impl IntoIterator<Item = SmolStr>) -> Self {
        Self {
            segments: segments.into_iter().collect(),
        }
    }

    /// Split a textual name on `::`.
    pub fn from_str(name: &str) -> Self {
        Self {
            segments: name.split("::").map(SmolStr::new).collect(),
        }
    }

    pub fn segments(&self) -> &[SmolStr] {
        &self.segments
    }

    pub fn is_qualified(&self) -> bool {
        self.segments.len() > 1
    }

    /// Last segment: the unqualified name.
    pub fn name(&self) -> &SmolStr {
        self.segments.last().expect("NamePath is never empty")
    }

    pub fn qualified(&self) -> String {
        self.segments.join("::")
    }
}

impl std::fmt::Display for NamePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.qualified())
    }
}
