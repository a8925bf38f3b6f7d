//! CrudService implementations

#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "in-memory")]
pub mod in_memory;

#[cfg(feature = "http")]
pub use http::HttpService;
#[cfg(feature = "in-memory")]
pub use in_memory::{InMemoryService, RecordedCall};
