use smol_str::SmolStr;

use crate::entry::{CodeSnippet, SnakeCasePolicy};

/// Access level forced by a modification rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifiedAccess {
    Private,
    Protected,
    Public,
}

/// Override of the final/virtual status used by the shadowing checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalOverride {
    Final,
    NonFinal,
}

/// Per-argument modification inside a [`FunctionModification`].
///
/// `position` is zero-based over the original argument list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArgumentModification {
    pub position: usize,
    pub removed: bool,
    /// Textual C++ type replacing the parsed one; resolved by the
    /// builder like any other type reference.
    pub replaced_type: Option<SmolStr>,
    pub replaced_default_value: Option<SmolStr>,
    pub rename: Option<SmolStr>,
}

impl ArgumentModification {
    pub fn remove(position: usize) -> Self {
        Self {
            position,
            removed: true,
            ..Self::default()
        }
    }

    pub fn replace_type(position: usize, ty: &str) -> Self {
        Self {
            position,
            replaced_type: Some(SmolStr::new(ty)),
            ..Self::default()
        }
    }

    pub fn replace_default(position: usize, expr: &str) -> Self {
        Self {
            position,
            replaced_default_value: Some(SmolStr::new(expr)),
            ..Self::default()
        }
    }
}

/// A per-function rule from the type system.
///
/// Matched against a function's minimal signature; an empty pattern
/// matches every overload of the name before the parenthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionModification {
    /// Minimal-signature pattern, e.g. `resize(int,int)`, or a bare
    /// name, e.g. `resize`, matching all overloads.
    pub signature: SmolStr,
    pub removed: bool,
    pub rename: Option<SmolStr>,
    pub access: Option<ModifiedAccess>,
    pub final_override: Option<FinalOverride>,
    pub argument_mods: Vec<ArgumentModification>,
    pub replaced_return_type: Option<SmolStr>,
    pub code_snippets: Vec<CodeSnippet>,
    pub snake_case: Option<SnakeCasePolicy>,
}

impl FunctionModification {
    pub fn new(signature: &str) -> Self {
        Self {
            signature: SmolStr::new(signature),
            removed: false,
            rename: None,
            access: None,
            final_override: None,
            argument_mods: Vec::new(),
            replaced_return_type: None,
            code_snippets: Vec::new(),
            snake_case: None,
        }
    }

    pub fn remove(signature: &str) -> Self {
        Self {
            removed: true,
            ..Self::new(signature)
        }
    }

    #[must_use]
    pub fn renamed(mut self, to: &str) -> Self {
        self.rename = Some(SmolStr::new(to));
        self
    }

    #[must_use]
    pub fn with_access(mut self, access: ModifiedAccess) -> Self {
        self.access = Some(access);
        self
    }

    #[must_use]
    pub fn with_argument_mod(mut self, m: ArgumentModification) -> Self {
        self.argument_mods.push(m);
        self
    }

    #[must_use]
    pub fn with_snippet(mut self, code: &str) -> Self {
        self.code_snippets.push(CodeSnippet::new(code));
        self
    }

    /// Does this rule apply to a function with the given minimal
    /// signature?
    pub fn matches(&self, minimal_signature: &str) -> bool {
        if self.signature.contains('(') {
            self.signature == minimal_signature
        } else {
            // Bare name: match any overload.
            minimal_signature
                .split('(')
                .next()
                .is_some_and(|name| name == self.signature)
        }
    }
}

/// A per-field rule from the type system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldModification {
    pub name: SmolStr,
    pub removed: bool,
    pub rename: Option<SmolStr>,
}

impl FieldModification {
    pub fn remove(name: &str) -> Self {
        Self {
            name: SmolStr::new(name),
            removed: true,
            rename: None,
        }
    }

    pub fn renamed(name: &str, to: &str) -> Self {
        Self {
            name: SmolStr::new(name),
            removed: false,
            rename: Some(SmolStr::new(to)),
        }
    }
}
