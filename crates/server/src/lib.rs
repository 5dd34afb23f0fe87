//! Readfeed recommendation service
//!
//! HTTP surface and Postgres/object-store collaborators around the
//! [`readfeed_engine`] hybrid blender.

pub mod artifacts;
pub mod config;
pub mod error;
pub mod handlers;
pub mod store;

pub use config::AppConfig;
pub use error::ApiError;
