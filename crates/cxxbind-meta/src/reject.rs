use std::collections::BTreeSet;

use smol_str::SmolStr;

/// Why a declaration was excluded from the output model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RejectReason {
    NotInTypeSystem,
    GenerationDisabled,
    RedefinedToNotClass,
    UnmatchedArgumentType,
    UnmatchedReturnType,
    ApiIncompatible,
    Deprecated,
}

impl RejectReason {
    pub fn describe(self) -> &'static str {
        match self {
            Self::NotInTypeSystem => "not in type system",
            Self::GenerationDisabled => "generation disabled by type system",
            Self::RedefinedToNotClass => "redefined to not be a class",
            Self::UnmatchedArgumentType => "unmatched argument type",
            Self::UnmatchedReturnType => "unmatched return type",
            Self::ApiIncompatible => "incompatible API",
            Self::Deprecated => "deprecated",
        }
    }
}

/// One recorded rejection.
///
/// Ordering is (sort key, signature, reason) so the surfaced log is
/// stable regardless of traversal order; inserting the same entry
/// twice is a no-op via the set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RejectEntry {
    pub sort_key: SmolStr,
    pub signature: SmolStr,
    pub reason: RejectReason,
    pub message: String,
}

impl RejectEntry {
    pub fn new(
        sort_key: impl Into<SmolStr>,
        signature: impl Into<SmolStr>,
        reason: RejectReason,
        message: impl Into<String>,
    ) -> Self {
        Self {
            sort_key: sort_key.into(),
            signature: signature.into(),
            reason,
            message: message.into(),
        }
    }
}

/// Rejections never abort the build; they accumulate here, separated
/// by declaration kind, and are surfaced sorted and deduplicated.
#[derive(Debug, Clone, Default)]
pub struct RejectLog {
    classes: BTreeSet<RejectEntry>,
    enums: BTreeSet<RejectEntry>,
    functions: BTreeSet<RejectEntry>,
    fields: BTreeSet<RejectEntry>,
}

impl RejectLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_class(&mut self, entry: RejectEntry) {
        self.classes.insert(entry);
    }

    pub fn reject_enum(&mut self, entry: RejectEntry) {
        self.enums.insert(entry);
    }

    pub fn reject_function(&mut self, entry: RejectEntry) {
        self.functions.insert(entry);
    }

    pub fn reject_field(&mut self, entry: RejectEntry) {
        self.fields.insert(entry);
    }

    pub fn classes(&self) -> impl Iterator<Item = &RejectEntry> {
        self.classes.iter()
    }

    pub fn enums(&self) -> impl Iterator<Item = &RejectEntry> {
        self.enums.iter()
    }

    pub fn functions(&self) -> impl Iterator<Item = &RejectEntry> {
        self.functions.iter()
    }

    pub fn fields(&self) -> impl Iterator<Item = &RejectEntry> {
        self.fields.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
            && self.enums.is_empty()
            && self.functions.is_empty()
            && self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.classes.len() + self.enums.len() + self.functions.len() + self.fields.len()
    }

    /// Find a function rejection by its recorded signature.
    pub fn find_function(&self, signature: &str) -> Option<&RejectEntry> {
        self.functions.iter().find(|e| e.signature == signature)
    }

    /// Render the whole log, one line per entry, sections in a fixed
    /// order.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (title, set) in [
            ("classes", &self.classes),
            ("enums", &self.enums),
            ("functions", &self.functions),
            ("fields", &self.fields),
        ] {
            if set.is_empty() {
                continue;
            }
            out.push_str("rejected ");
            out.push_str(title);
            out.push_str(":\n");
            for entry in set {
                out.push_str("  ");
                out.push_str(&entry.signature);
                out.push_str(": ");
                out.push_str(entry.reason.describe());
                if !entry.message.is_empty() {
                    out.push_str(" (");
                    out.push_str(&entry.message);
                    out.push(')');
                }
                out.push('\n');
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_insertion_is_noop() {
        let mut log = RejectLog::new();
        let e = RejectEntry::new("k", "f(int)", RejectReason::UnmatchedArgumentType, "no `Foo`");
        log.reject_function(e.clone());
        log.reject_function(e);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn entries_sorted_by_key_then_signature() {
        let mut log = RejectLog::new();
        log.reject_function(RejectEntry::new("b", "g()", RejectReason::Deprecated, ""));
        log.reject_function(RejectEntry::new("a", "z()", RejectReason::Deprecated, ""));
        log.reject_function(RejectEntry::new("a", "a()", RejectReason::Deprecated, ""));
        let sigs: Vec<&str> = log.functions().map(|e| e.signature.as_str()).collect();
        assert_eq!(sigs, vec!["a()", "z()", "g()"]);
    }

    #[test]
    fn dump_contains_reason_text() {
        let mut log = RejectLog::new();
        log.reject_class(RejectEntry::new(
            "Widget",
            "Widget",
            RejectReason::NotInTypeSystem,
            "",
        ));
        let dump = log.dump();
        assert!(dump.contains("rejected classes:"));
        assert!(dump.contains("Widget: not in type system"));
    }

    #[test]
    fn find_function_by_signature() {
        let mut log = RejectLog::new();
        log.reject_function(RejectEntry::new(
            "k",
            "f(int)",
            RejectReason::UnmatchedReturnType,
            "",
        ));
        let e = log.find_function("f(int)").unwrap();
        assert_eq!(e.reason, RejectReason::UnmatchedReturnType);
        assert!(log.find_function("g()").is_none());
    }
}
