//! HTML page templates

pub mod errors;
pub mod forum;
