//! Application services layer.

pub mod error;
pub mod following;
pub mod lists;
pub mod pagination;
pub mod repos;
pub mod store;
