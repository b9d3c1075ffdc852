//! Shared wire model for the `TaskBoard` REST API.

pub mod codec;
pub mod query;
pub mod request;
pub mod task;
pub mod workspace;
