pub mod executor;
pub mod pagination;
pub mod translator;

pub use executor::{QueryPage, execute};
pub use pagination::{PageLink, PageRequest, Pagination, plan};
pub use translator::{FieldKind, Filter, Manifest, Predicate, QueryDescriptor, SortKey, translate};
