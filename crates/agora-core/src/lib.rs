//! agora/crates/agora-core/src/lib.rs
//!
//! Domain models, flag value types, the error taxonomy, and the collaborator
//! ports for the Agora discussion engine.

pub mod error;
pub mod flags;
pub mod models;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use flags::*;
pub use models::*;
pub use traits::*;
