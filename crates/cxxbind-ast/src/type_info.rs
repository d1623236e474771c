use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::NamePath;

/// Reference qualifier of a type usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReferenceKind {
    #[default]
    None,
    LValue,
    RValue,
}

/// One level of pointer indirection.
///
/// `ConstPointer` is `*const` -- the pointer itself is const, not the
/// pointee (`const T *` is `constant` on the base type instead).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Indirection {
    Pointer,
    ConstPointer,
}

/// One C array dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayBound {
    Known(u64),
    /// `[]` -- unknown bound; bindings degrade this to a pointer.
    Unknown,
}

/// Signature of a function-pointer type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionSignature {
    pub return_type: TypeInfo,
    pub parameters: Vec<TypeInfo>,
}

/// A raw textual type reference from the code model.
///
/// Not yet resolved against the type system: the name is whatever the
/// parser spelled, template arguments are themselves raw `TypeInfo`s.
/// Resolution into a semantic type happens in the builder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    pub qualified_name: NamePath,
    pub constant: bool,
    pub volatile_: bool,
    pub reference: ReferenceKind,
    pub indirections: SmallVec<[Indirection; 2]>,
    pub array_bounds: Vec<ArrayBound>,
    pub template_args: Vec<TypeInfo>,
    pub function_signature: Option<Box<FunctionSignature>>,
}

impl TypeInfo {
    pub fn named(name: &str) -> Self {
        Self {
            qualified_name: NamePath::from_str(name),
            constant: false,
            volatile_: false,
            reference: ReferenceKind::None,
            indirections: SmallVec::new(),
            array_bounds: Vec::new(),
            template_args: Vec::new(),
            function_signature: None,
        }
    }

    pub fn void() -> Self {
        Self::named("void")
    }

    #[must_use]
    pub fn with_const(mut self) -> Self {
        self.constant = true;
        self
    }

    #[must_use]
    pub fn with_pointer(mut self) -> Self {
        self.indirections.push(Indirection::Pointer);
        self
    }

    #[must_use]
    pub fn with_lvalue_ref(mut self) -> Self {
        self.reference = ReferenceKind::LValue;
        self
    }

    #[must_use]
    pub fn with_rvalue_ref(mut self) -> Self {
        self.reference = ReferenceKind::RValue;
        self
    }

    #[must_use]
    pub fn with_template_args(mut self, args: Vec<TypeInfo>) -> Self {
        self.template_args = args;
        self
    }

    #[must_use]
    pub fn with_array_bound(mut self, bound: ArrayBound) -> Self {
        self.array_bounds.push(bound);
        self
    }

    pub fn is_void(&self) -> bool {
        self.indirections.is_empty()
            && self.reference == ReferenceKind::None
            && self.array_bounds.is_empty()
            && !self.qualified_name.is_qualified()
            && self.qualified_name.name() == "void"
    }

    /// Canonical C++ spelling of this reference.
    pub fn to_type_string(&self) -> String {
        let mut s = String::new();
        if self.constant {
            s.push_str("const ");
        }
        if self.volatile_ {
            s.push_str("volatile ");
        }
        s.push_str(&self.qualified_name.qualified());
        if !self.template_args.is_empty() {
            s.push('<');
            for (i, arg) in self.template_args.iter().enumerate() {
                if i > 0 {
                    s.push_str(", ");
                }
                s.push_str(&arg.to_type_string());
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

    /// Parse a C++ type spelling into a `TypeInfo`.
    ///
    /// Understands cv qualifiers, `::`-qualified names, multi-word
    /// builtin names (`unsigned long long`), template argument lists,
    /// pointers (including `* const`), references, and array bounds.
    /// Function-pointer spellings are not parsed; those only enter the
    /// model programmatically.
    pub fn parse(text: &str) -> Result<Self, TypeParseError> {
        let mut p = Parser::new(text);
        let info = p.parse_type()?;
        p.skip_ws();
        if !p.at_end() {
            return Err(TypeParseError::trailing(text, p.pos));
        }
        Ok(info)
    }
}

/// Error from [`TypeInfo::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParseError {
    pub text: SmolStr,
    pub offset: usize,
}

impl TypeParseError {
    fn trailing(text: &str, offset: usize) -> Self {
        Self {
            text: SmolStr::new(text),
            offset,
        }
    }
}

impl std::fmt::Display for TypeParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cannot parse type `{}` (at offset {})",
            self.text, self.offset
        )
    }
}

/// Builtin type words that join into one multi-word name.
const BUILTIN_WORDS: &[&str] = &[
    "unsigned", "signed", "long", "short", "int", "char", "double", "float", "bool",
];

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.rest().chars().next() {
            if c.is_whitespace() {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, kw: &str) -> bool {
        self.skip_ws();
        let rest = self.rest();
        if rest.starts_with(kw) {
            let after = rest[kw.len()..].chars().next();
            if !after.is_some_and(|c| c.is_alphanumeric() || c == '_') {
                self.pos += kw.len();
                return true;
            }
        }
        false
    }

    fn ident(&mut self) -> Option<&'a str> {
        self.skip_ws();
        let rest = self.rest();
        let mut end = 0;
        for (i, c) in rest.char_indices() {
            let ok = if i == 0 {
                c.is_alphabetic() || c == '_'
            } else {
                c.is_alphanumeric() || c == '_'
            };
            if !ok {
                break;
            }
            end = i + c.len_utf8();
        }
        if end == 0 {
            return None;
        }
        self.pos += end;
        Some(&rest[..end])
    }

    fn parse_type(&mut self) -> Result<TypeInfo, TypeParseError> {
        let mut constant = false;
        let mut volatile_ = false;
        loop {
            if self.eat_keyword("const") {
                constant = true;
            } else if self.eat_keyword("volatile") {
                volatile_ = true;
            } else {
                break;
            }
        }

        let first = self
            .ident()
            .ok_or_else(|| TypeParseError::trailing(self.src, self.pos))?;

        let mut segments: Vec<SmolStr> = Vec::new();
        if BUILTIN_WORDS.contains(&first) {
            // Join `unsigned long long` into one name segment.
            let mut words = vec![first];
            loop {
                let save = self.pos;
                match self.ident() {
                    Some(w) if BUILTIN_WORDS.contains(&w) => words.push(w),
                    _ => {
                        self.pos = save;
                        break;
                    }
                }
            }
            segments.push(SmolStr::new(words.join(" ")));
        } else {
            segments.push(SmolStr::new(first));
            while self.eat("::") {
                let seg = self
                    .ident()
                    .ok_or_else(|| TypeParseError::trailing(self.src, self.pos))?;
                segments.push(SmolStr::new(seg));
            }
        }

        let mut info = TypeInfo {
            qualified_name: NamePath::new(segments),
            constant,
            volatile_,
            reference: ReferenceKind::None,
            indirections: SmallVec::new(),
            array_bounds: Vec::new(),
            template_args: Vec::new(),
            function_signature: None,
        };

        self.skip_ws();
        if self.rest().starts_with('<') {
            self.pos += 1;
            loop {
                info.template_args.push(self.parse_type()?);
                if self.eat(",") {
                    continue;
                }
                if self.eat(">") {
                    break;
                }
                return Err(TypeParseError::trailing(self.src, self.pos));
            }
        }

        loop {
            self.skip_ws();
            let rest = self.rest();
            if rest.starts_with("&&") {
                self.pos += 2;
                info.reference = ReferenceKind::RValue;
            } else if rest.starts_with('&') {
                self.pos += 1;
                info.reference = ReferenceKind::LValue;
            } else if rest.starts_with('*') {
                self.pos += 1;
                info.indirections.push(Indirection::Pointer);
            } else if rest.starts_with('[') {
                self.pos += 1;
                self.skip_ws();
                let digits_start = self.pos;
                while self.rest().chars().next().is_some_and(|c| c.is_ascii_digit()) {
                    self.pos += 1;
                }
                let digits = &self.src[digits_start..self.pos];
                if !self.eat("]") {
                    return Err(TypeParseError::trailing(self.src, self.pos));
                }
                let bound = if digits.is_empty() {
                    ArrayBound::Unknown
                } else {
                    let n = digits
                        .parse::<u64>()
                        .map_err(|_| TypeParseError::trailing(self.src, digits_start))?;
                    ArrayBound::Known(n)
                };
                info.array_bounds.push(bound);
            } else if self.eat_keyword("const") {
                // `T * const` marks the last pointer level const;
                // trailing const without a pointer is east-const on
                // the base type.
                match info.indirections.last_mut() {
                    Some(level) => *level = Indirection::ConstPointer,
                    None => info.constant = true,
                }
            } else {
                break;
            }
        }

        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plain_name() {
        let t = TypeInfo::parse("Widget").unwrap();
        assert_eq!(t.qualified_name.qualified(), "Widget");
        assert!(!t.constant);
        assert_eq!(t.reference, ReferenceKind::None);
        assert!(t.indirections.is_empty());
    }

    #[test]
    fn parse_qualified_name() {
        let t = TypeInfo::parse("ns::detail::Widget").unwrap();
        assert_eq!(t.qualified_name.qualified(), "ns::detail::Widget");
    }

    #[test]
    fn parse_const_ref() {
        let t = TypeInfo::parse("const Widget &").unwrap();
        assert!(t.constant);
        assert_eq!(t.reference, ReferenceKind::LValue);
    }

    #[test]
    fn parse_east_const() {
        let t = TypeInfo::parse("Widget const &").unwrap();
        assert!(t.constant);
        assert_eq!(t.reference, ReferenceKind::LValue);
    }

    #[test]
    fn parse_rvalue_ref() {
        let t = TypeInfo::parse("Widget &&").unwrap();
        assert_eq!(t.reference, ReferenceKind::RValue);
    }

    #[test]
    fn parse_pointer_levels() {
        let t = TypeInfo::parse("char **").unwrap();
        assert_eq!(t.indirections.len(), 2);
        assert_eq!(t.indirections[0], Indirection::Pointer);
    }

    #[test]
    fn parse_const_pointer() {
        let t = TypeInfo::parse("char * const").unwrap();
        assert_eq!(t.indirections.as_slice(), &[Indirection::ConstPointer]);
        assert!(!t.constant);
    }

    #[test]
    fn parse_multiword_builtin() {
        let t = TypeInfo::parse("unsigned long long").unwrap();
        assert_eq!(t.qualified_name.qualified(), "unsigned long long");
    }

    #[test]
    fn parse_template_args() {
        let t = TypeInfo::parse("List<ns::Item>").unwrap();
        assert_eq!(t.template_args.len(), 1);
        assert_eq!(t.template_args[0].qualified_name.qualified(), "ns::Item");
    }

    #[test]
    fn parse_nested_template_args() {
        let t = TypeInfo::parse("Map<Key, List<Value>>").unwrap();
        assert_eq!(t.template_args.len(), 2);
        assert_eq!(t.template_args[1].template_args.len(), 1);
    }

    #[test]
    fn parse_template_arg_with_qualifiers() {
        let t = TypeInfo::parse("List<const Item &>").unwrap();
        assert!(t.template_args[0].constant);
        assert_eq!(t.template_args[0].reference, ReferenceKind::LValue);
    }

    #[test]
    fn parse_array_bounds() {
        let t = TypeInfo::parse("int [4][]").unwrap();
        assert_eq!(
            t.array_bounds,
            vec![ArrayBound::Known(4), ArrayBound::Unknown]
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(TypeInfo::parse("Widget %").is_err());
        assert!(TypeInfo::parse("").is_err());
        assert!(TypeInfo::parse("List<").is_err());
    }

    #[test]
    fn round_trip_spelling() {
        for spelling in [
            "const ns::Widget&",
            "List<Item>*",
            "unsigned int",
            "char*const",
            "Map<Key, Value>&&",
        ] {
            let t = TypeInfo::parse(spelling).unwrap();
            let again = TypeInfo::parse(&t.to_type_string()).unwrap();
            assert_eq!(t, again, "spelling: {spelling}");
        }
    }

    #[test]
    fn is_void() {
        assert!(TypeInfo::parse("void").unwrap().is_void());
        assert!(!TypeInfo::parse("void*").unwrap().is_void());
        assert!(!TypeInfo::parse("int").unwrap().is_void());
    }

    #[test]
    fn const_not_taken_as_ident_prefix() {
        // `constant_pool` starts with the letters of `const` but is an
        // ordinary identifier.
        let t = TypeInfo::parse("constant_pool::Entry").unwrap();
        assert!(!t.constant);
        assert_eq!(t.qualified_name.qualified(), "constant_pool::Entry");
    }
}
