use cxxbind_source::SourceLocation;
use smol_str::SmolStr;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// Structured diagnostic emitted while building the metamodel.
///
/// Diagnostics are plain data accumulated per build run and surfaced
/// on the result; the builder never writes to a global logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDiag {
    pub severity: Severity,
    pub kind: BuildDiagKind,
    pub location: Option<SourceLocation>,
}

/// Every warning and informational message the pipeline can emit.
///
/// Closed set: downstream tooling matches on kinds, not message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildDiagKind {
    /// Base class name did not resolve; the class was attached to the
    /// configured default superclass instead of being dropped.
    UnresolvedBaseClass {
        class: SmolStr,
        base: SmolStr,
    },
    /// An override narrows the access of the inherited function.
    VisibilityNarrowed {
        class: SmolStr,
        function: SmolStr,
    },
    /// A non-virtual base function is shadowed by a derived one.
    ShadowedFunction {
        base_class: SmolStr,
        derived_class: SmolStr,
        function: SmolStr,
    },
    /// A class marked final is extended; the final flag is removed.
    FinalClassExtended {
        class: SmolStr,
    },
    /// Unqualified name matched entries in more than one scope level.
    AmbiguousTypeName {
        name: SmolStr,
        candidates: Vec<SmolStr>,
    },
    /// Container/smart-pointer instantiation skipped because one of
    /// its arguments is still an unbound template parameter.
    UnresolvedTemplateInstantiation {
        type_name: SmolStr,
        context: SmolStr,
    },
    /// A template member could not be specialized for an
    /// instantiation and was left out of the specialized class.
    TemplateMemberDropped {
        class: SmolStr,
        member: SmolStr,
    },
    /// An enumerator value could not be parsed from its expression.
    EnumValueUnparsed {
        enum_name: SmolStr,
        value: SmolStr,
    },
    /// A default-value expression could not be qualified and is kept
    /// verbatim.
    DefaultValueUnqualified {
        function: SmolStr,
        expression: SmolStr,
    },
    /// A modification rule matched no function in the class.
    UnmatchedModification {
        class: SmolStr,
        signature: SmolStr,
    },
}

impl BuildDiag {
    pub fn warning(kind: BuildDiagKind) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            location: None,
        }
    }

    pub fn info(kind: BuildDiagKind) -> Self {
        Self {
            severity: Severity::Info,
            kind,
            location: None,
        }
    }

    #[must_use]
    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Format this diagnostic into a human-readable message string.
    pub fn format(&self) -> String {
        let body = match &self.kind {
            BuildDiagKind::UnresolvedBaseClass { class, base } => {
                format!("class `{class}`: base class `{base}` not found, using default superclass")
            }
            BuildDiagKind::VisibilityNarrowed { class, function } => {
                format!("visibility of `{function}` narrowed in `{class}`")
            }
            BuildDiagKind::ShadowedFunction {
                base_class,
                derived_class,
                function,
            } => format!(
                "`{derived_class}::{function}` shadows non-virtual `{base_class}::{function}`"
            ),
            BuildDiagKind::FinalClassExtended { class } => {
                format!("final class `{class}` set to non-final, as it is extended by other classes")
            }
            BuildDiagKind::AmbiguousTypeName { name, candidates } => {
                let list: Vec<&str> = candidates.iter().map(SmolStr::as_str).collect();
                format!("type name `{name}` is ambiguous between {}", list.join(", "))
            }
            BuildDiagKind::UnresolvedTemplateInstantiation { type_name, context } => {
                if context.is_empty() {
                    format!("skipping instantiation of `{type_name}`: unresolved template arguments")
                } else {
                    format!(
                        "skipping instantiation of `{type_name}`: unresolved template arguments (context: {context})"
                    )
                }
            }
            BuildDiagKind::TemplateMemberDropped { class, member } => {
                format!("member `{member}` left out of specialization `{class}`")
            }
            BuildDiagKind::EnumValueUnparsed { enum_name, value } => {
                format!("could not evaluate enumerator `{value}` of `{enum_name}`")
            }
            BuildDiagKind::DefaultValueUnqualified { function, expression } => {
                format!("default value `{expression}` of `{function}` kept verbatim")
            }
            BuildDiagKind::UnmatchedModification { class, signature } => {
                format!("modification `{signature}` matched no function in `{class}`")
            }
        };
        match &self.location {
            Some(loc) if loc.is_known() => format!("{loc}: {body}"),
            _ => body,
        }
    }
}

/// Sort and deduplicate a diagnostic list for deterministic surfacing.
///
/// Ordering key is (severity, formatted message) so identical warnings
/// produced via different traversal paths collapse into one entry.
pub fn sorted_unique(mut diags: Vec<BuildDiag>) -> Vec<BuildDiag> {
    diags.sort_by(|a, b| {
        (a.severity, a.format()).cmp(&(b.severity, b.format()))
    });
    diags.dedup();
    diags
}
