//! CLI command implementations

pub mod fetch;
pub mod hook;
pub mod index;
pub mod show;
pub mod status;
