mod collect;
mod result;
mod topo;

pub use collect::InstantiatedSmartPointer;
pub use result::{ApiExtractor, ExtractorResult};
pub use topo::{topological_sort, Dependency};
