pub use text_size::{TextRange, TextSize};

use smol_str::SmolStr;

/// Opaque handle to a header file in the code model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

/// A span within a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub file: FileId,
    pub range: TextRange,
}

/// Declaration site of a code-model item, as reported by the upstream
/// C++ parser.
///
/// Carried by every item and threaded onto diagnostics so rejection
/// and warning logs can point back at the header line. The file name
/// is kept textually because the parser reports paths, not `FileId`s,
/// for declarations pulled in from system headers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SourceLocation {
    pub file_name: SmolStr,
    pub line: u32,
}

impl SourceLocation {
    pub fn new(file_name: impl Into<SmolStr>, line: u32) -> Self {
        Self {
            file_name: file_name.into(),
            line,
        }
    }

    pub fn is_known(&self) -> bool {
        !self.file_name.is_empty()
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_known() {
            write!(f, "{}:{}", self.file_name, self.line)
        } else {
            f.write_str("<unknown>")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_display() {
        let loc = SourceLocation::new("widget.h", 42);
        assert_eq!(loc.to_string(), "widget.h:42");
    }

    #[test]
    fn unknown_location_display() {
        assert_eq!(SourceLocation::default().to_string(), "<unknown>");
        assert!(!SourceLocation::default().is_known());
    }
}
