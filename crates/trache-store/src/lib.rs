//! # trache-store
//!
//! File-backed storage for the agency site: the JSON content document
//! ([`ContentStore`]) and the CSV log of contact messages ([`MessageLog`]).
//!
//! Both are plain synchronous handles over a path. Nothing is cached;
//! callers load a snapshot, change it, and write it back. Every write goes
//! through a temp file and a rename, then is handed to a [`Mirror`] for
//! best-effort off-site copies.

pub mod content;
pub mod document;
pub mod messages;
pub mod mirror;
pub mod models;
pub mod seed;

mod error;
mod fs;

pub use content::ContentStore;
pub use document::{normalize_image_reference, remove_at, SearchResults};
pub use error::{Result, StoreError};
pub use messages::MessageLog;
pub use mirror::{Mirror, NoMirror};
pub use models::*;
