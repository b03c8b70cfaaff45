//! folio/crates/folio-core/src/lib.rs
//!
//! The content-block model and port definitions for Folio.

pub mod codec;
pub mod editor;
pub mod error;
pub mod migration;
pub mod models;
pub mod render;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;
