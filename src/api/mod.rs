//! REST API surface

pub mod objects;
pub mod routes;

pub use routes::router;
