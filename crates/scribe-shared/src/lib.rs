//! # Scribe Shared
//!
//! Shared types between the API server and its clients.
//! Nothing here depends on the domain crate, so clients can compile it on its own.

pub mod dto;
pub mod response;

pub use response::{ApiResponse, ErrorResponse, FieldProblem};
