pub mod http;
pub mod traits;

pub use http::StreamingApi;
pub use traits::{CatalogService, MediaSourceResolver, ProgressStore};
