#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs,
    rustdoc::broken_intra_doc_links,
    rustdoc::missing_crate_level_docs
)]

//! Member portal library: forum topic pages and member email dispatch

pub mod domain;
pub mod infrastructure;
