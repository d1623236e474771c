use cxxbind_ast::Access;
use smol_str::SmolStr;

use crate::arena::ClassId;
use crate::types::MetaType;

/// A resolved member variable.
///
/// The enclosing class is a back-reference into the arena, never an
/// ownership edge. Created during member traversal; only the
/// documentation-filling pass mutates it afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaField {
    pub enclosing_class: ClassId,
    pub name: SmolStr,
    /// Pre-rename C++ name.
    pub original_name: SmolStr,
    pub ty: MetaType,
    pub access: Access,
    pub is_static: bool,
    pub documentation: SmolStr,
}

impl MetaField {
    pub fn new(enclosing_class: ClassId, name: impl Into<SmolStr>, ty: MetaType) -> Self {
        let name = name.into();
        Self {
            enclosing_class,
            original_name: name.clone(),
            name,
            ty,
            access: Access::Public,
            is_static: false,
            documentation: SmolStr::default(),
        }
    }

    pub fn can_generate_getter(&self) -> bool {
        true
    }

    /// Arrays cannot be reassigned and a const non-pointer member is
    /// immutable, so neither gets a setter.
    pub fn can_generate_setter(&self) -> bool {
        if !self.ty.array_bounds().is_empty() || self.ty.is_degraded_from_array() {
            return false;
        }
        !(self.ty.is_constant() && self.ty.indirections().is_empty())
    }

    pub fn is_renamed(&self) -> bool {
        self.name != self.original_name
    }
}
