mod database;
mod entry;
mod modifications;

pub use database::{TypeDatabase, TypeDatabaseBuilder};
pub use entry::{
    CodeSnippet, ContainerKind, SmartPointerKind, SnakeCasePolicy, TypeEntry, TypeEntryId,
    TypeEntryKind,
};
pub use modifications::{
    ArgumentModification, FieldModification, FinalOverride, FunctionModification, ModifiedAccess,
};
