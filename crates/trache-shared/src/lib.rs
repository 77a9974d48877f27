//! # trache-shared
//!
//! Constants and small helpers shared by the content store and the HTTP
//! server: upload filename sanitizing, accent folding, service page kinds.

pub mod constants;
pub mod filename;
pub mod text;
pub mod types;
