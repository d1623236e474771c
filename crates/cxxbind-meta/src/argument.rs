use smol_str::SmolStr;

use crate::types::MetaType;

/// A resolved function argument.
///
/// Keeps both the parsed type and the rule-modified type, and both the
/// spelled default value and its rewritten form; override matching
/// uses the modified side, documentation the original side.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaArgument {
    pub name: SmolStr,
    /// False when the parameter was unnamed and the builder invented
    /// `arg_<n>`.
    pub has_real_name: bool,
    pub ty: MetaType,
    pub modified_ty: Option<MetaType>,
    pub original_default_value: Option<SmolStr>,
    pub default_value: Option<SmolStr>,
    /// Removed from the target-language signature by a rule; the
    /// argument stays in the list for C++-side bookkeeping.
    pub removed: bool,
    /// Zero-based position in the original argument list.
    pub position: usize,
    pub documentation: SmolStr,
}

impl MetaArgument {
    pub fn new(name: impl Into<SmolStr>, ty: MetaType, position: usize) -> Self {
        Self {
            name: name.into(),
            has_real_name: true,
            ty,
            modified_ty: None,
            original_default_value: None,
            default_value: None,
            removed: false,
            position,
            documentation: SmolStr::default(),
        }
    }

    /// The type used for dispatch and override matching.
    pub fn effective_type(&self) -> &MetaType {
        self.modified_ty.as_ref().unwrap_or(&self.ty)
    }

    pub fn is_type_modified(&self) -> bool {
        match &self.modified_ty {
            Some(m) => *m != self.ty,
            None => false,
        }
    }

    pub fn has_default_value(&self) -> bool {
        self.default_value.is_some() || self.original_default_value.is_some()
    }

    pub fn is_default_value_modified(&self) -> bool {
        match (&self.default_value, &self.original_default_value) {
            (Some(a), Some(b)) => a != b,
            (Some(_), None) => true,
            _ => false,
        }
    }
}
