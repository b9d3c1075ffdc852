//! `TaskBoard`: task board ordering and remote sync client library.

pub mod api;
pub mod board;
pub mod cache;
pub mod config;
pub mod session;
pub mod store;
pub mod sync;
pub mod view;
