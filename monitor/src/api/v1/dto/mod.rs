//! v1 API Data Transfer Objects.
//!
//! Query parameters and response bodies specific to the HTTP surface.
//! Dashboard outputs such as charts and suggestion rows are serialized
//! directly from their domain types.

pub mod queries;
pub mod responses;

pub use queries::*;
pub use responses::*;
