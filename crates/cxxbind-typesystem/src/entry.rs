use smol_str::SmolStr;

/// Index of a type entry in its owning [`TypeDatabase`].
///
/// [`TypeDatabase`]: crate::TypeDatabase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeEntryId(pub(crate) u32);

impl TypeEntryId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What kind of container a container entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Sequence,
    Set,
    Map,
    Pair,
    Span,
}

/// What kind of smart pointer a smart-pointer entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SmartPointerKind {
    Shared,
    Unique,
    Handle,
    ValueHandle,
}

/// Whether generated names keep the C++ spelling or are converted to
/// snake_case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnakeCasePolicy {
    #[default]
    Original,
    SnakeCase,
}

/// Injected code attached to a type entry or function modification.
///
/// The collection pass scans snippet text for `%CONVERTTOTARGET[...]`
/// and `%CONVERTTONATIVE[...]` type markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSnippet {
    pub code: SmolStr,
}

impl CodeSnippet {
    pub fn new(code: impl Into<SmolStr>) -> Self {
        Self { code: code.into() }
    }
}

/// The closed set of type-entry kinds.
///
/// Dispatch over type behavior is a `match` on this, never a name
/// comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeEntryKind {
    Primitive,
    Void,
    Varargs,
    Enum,
    /// An OR-combinable flags type over an enum entry.
    Flags { underlying: TypeEntryId },
    /// Copyable value class, passed by value in the target language.
    Value,
    /// Identity class, always passed by pointer/reference.
    Object,
    Container { kind: ContainerKind },
    SmartPointer { kind: SmartPointerKind },
    Namespace,
    FunctionType,
    Typedef { target: TypeEntryId },
    /// An unbound template parameter of a template class.
    TemplateArgument { ordinal: u32 },
    Custom,
}

/// One record of the type-system rule table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeEntry {
    pub qualified_name: SmolStr,
    pub kind: TypeEntryKind,
    /// Rename target; `None` keeps the C++ name.
    pub target_name: Option<SmolStr>,
    pub generate_code: bool,
    /// Explicitly dropped by the rules: resolvable, but every use is
    /// rejected. Distinct from "not found".
    pub suppressed: bool,
    pub allow_default_constructor: bool,
    pub allow_default_copy_constructor: bool,
    pub snake_case: SnakeCasePolicy,
    pub code_snippets: Vec<CodeSnippet>,
}

impl TypeEntry {
    pub fn new(qualified_name: &str, kind: TypeEntryKind) -> Self {
        Self {
            qualified_name: SmolStr::new(qualified_name),
            kind,
            target_name: None,
            generate_code: true,
            suppressed: false,
            allow_default_constructor: false,
            allow_default_copy_constructor: false,
            snake_case: SnakeCasePolicy::default(),
            code_snippets: Vec::new(),
        }
    }

    pub fn primitive(name: &str) -> Self {
        Self::new(name, TypeEntryKind::Primitive)
    }

    pub fn void() -> Self {
        Self::new("void", TypeEntryKind::Void)
    }

    pub fn varargs() -> Self {
        Self::new("...", TypeEntryKind::Varargs)
    }

    pub fn value(name: &str) -> Self {
        Self::new(name, TypeEntryKind::Value)
    }

    pub fn object(name: &str) -> Self {
        Self::new(name, TypeEntryKind::Object)
    }

    pub fn enum_type(name: &str) -> Self {
        Self::new(name, TypeEntryKind::Enum)
    }

    pub fn namespace(name: &str) -> Self {
        Self::new(name, TypeEntryKind::Namespace)
    }

    pub fn container(name: &str, kind: ContainerKind) -> Self {
        Self::new(name, TypeEntryKind::Container { kind })
    }

    pub fn smart_pointer(name: &str, kind: SmartPointerKind) -> Self {
        Self::new(name, TypeEntryKind::SmartPointer { kind })
    }

    pub fn template_argument(name: &str, ordinal: u32) -> Self {
        Self::new(name, TypeEntryKind::TemplateArgument { ordinal })
    }

    #[must_use]
    pub fn renamed(mut self, target: &str) -> Self {
        self.target_name = Some(SmolStr::new(target));
        self
    }

    #[must_use]
    pub fn suppress(mut self) -> Self {
        self.suppressed = true;
        self
    }

    #[must_use]
    pub fn no_codegen(mut self) -> Self {
        self.generate_code = false;
        self
    }

    #[must_use]
    pub fn with_default_constructors(mut self) -> Self {
        self.allow_default_constructor = true;
        self.allow_default_copy_constructor = true;
        self
    }

    #[must_use]
    pub fn with_snippet(mut self, code: &str) -> Self {
        self.code_snippets.push(CodeSnippet::new(code));
        self
    }

    /// Unqualified C++ name: the last `::` segment.
    pub fn name(&self) -> &str {
        self.qualified_name
            .rsplit("::")
            .next()
            .unwrap_or(&self.qualified_name)
    }

    /// Name used in the target language: rename target or C++ name.
    pub fn target_lang_name(&self) -> &str {
        self.target_name.as_deref().unwrap_or_else(|| self.name())
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self.kind, TypeEntryKind::Primitive)
    }

    pub fn is_void(&self) -> bool {
        matches!(self.kind, TypeEntryKind::Void)
    }

    pub fn is_varargs(&self) -> bool {
        matches!(self.kind, TypeEntryKind::Varargs)
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.kind, TypeEntryKind::Enum)
    }

    pub fn is_flags(&self) -> bool {
        matches!(self.kind, TypeEntryKind::Flags { .. })
    }

    pub fn is_value(&self) -> bool {
        matches!(self.kind, TypeEntryKind::Value)
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind, TypeEntryKind::Object)
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind, TypeEntryKind::Container { .. })
    }

    pub fn is_smart_pointer(&self) -> bool {
        matches!(self.kind, TypeEntryKind::SmartPointer { .. })
    }

    pub fn is_namespace(&self) -> bool {
        matches!(self.kind, TypeEntryKind::Namespace)
    }

    pub fn is_template_argument(&self) -> bool {
        matches!(self.kind, TypeEntryKind::TemplateArgument { .. })
    }

    pub fn is_typedef(&self) -> bool {
        matches!(self.kind, TypeEntryKind::Typedef { .. })
    }

    /// Entries that can own members: classes and namespaces.
    pub fn is_complex(&self) -> bool {
        matches!(
            self.kind,
            TypeEntryKind::Value
                | TypeEntryKind::Object
                | TypeEntryKind::Namespace
                | TypeEntryKind::Container { .. }
                | TypeEntryKind::SmartPointer { .. }
        )
    }
}
