//! In-process cache layer of a federated social server.
//!
//! Entities and ID collections are read through [`cache::CacheRegistry`] by
//! the cached data access layer in [`application::store`], which the HTTP
//! surface in [`infra::http`] uses to serve paginated collections.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
