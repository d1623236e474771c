mod argument;
mod arena;
mod builder;
mod class;
mod enums;
mod field;
mod function;
mod inheritance;
mod members;
mod reject;
mod template_inherit;
mod translate;
mod types;

pub use argument::MetaArgument;
pub use arena::{ClassArena, ClassId};
pub use builder::{BuildOptions, FatalBuildError, MetaBuilder, MetaModel};
pub use class::{ClassAttributes, MetaClass, MetaClassKind, UsingMember};
pub use enums::{MetaEnum, MetaEnumValue};
pub use field::MetaField;
pub use function::{CompareResult, FunctionAttributes, FunctionKind, MetaFunction};
pub use reject::{RejectEntry, RejectLog, RejectReason};
pub use translate::{translate_type, NotFoundReason, TranslateError};
pub use types::{MetaType, TypeUsagePattern};
