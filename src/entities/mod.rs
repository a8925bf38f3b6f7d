//! Backend models of the academy and their typed hooks

pub mod macros;
pub mod models;
pub mod records;
pub mod registry;
pub mod subscription;
pub mod test_taking;

pub use models::*;
pub use records::{CourseRecord, MentorRecord, ProductLevel, ProductRecord};
pub use registry::{EntityRegistry, RegistryError};
