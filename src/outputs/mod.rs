//! Output generation for assembled documents.
//!
//! # Submodules
//!
//! - [`markdown`]: renders a [`Document`](crate::models::Document) as one Markdown book
//! - [`json`]: dumps the same document as JSON for downstream tooling

pub mod json;
pub mod markdown;
