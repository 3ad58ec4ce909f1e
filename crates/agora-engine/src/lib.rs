//! # agora-engine
//!
//! The retrieval/export engine over the `agora-core` ports: vaults own all
//! storage access, exporters transform entities into serializable bundles,
//! and the builder orchestrates one bounded export operation at a time.

pub mod builder;
pub mod dispatch;
pub mod export;
pub mod factory;
pub mod flags;
pub mod vaults;

pub use builder::{ExportBuilder, MissingPostPolicy};
pub use dispatch::ActionTable;
pub use factory::EngineFactory;
pub use flags::FlagManager;
