//! HTTP API over the report pipeline.

mod error;
mod routes;

pub use error::ApiError;
pub use routes::router;
