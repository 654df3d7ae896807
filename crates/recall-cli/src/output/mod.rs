//! Output formatting

pub mod colors;
pub mod json;
