//! # Engine Factory
//!
//! The single construction point. Collaborators are injected once, here;
//! vaults, exporters, and builders come out fully wired and never construct
//! their own dependencies.

use std::sync::Arc;

use agora_core::{DataStore, FileStore, FlagRegistry, ViewPolicy};

use crate::builder::{ExportBuilder, MissingPostPolicy};
use crate::export::{DiscussionExporter, PostExporter};
use crate::flags::FlagManager;
use crate::vaults::{AttachmentVault, AuthorVault, DiscussionVault, PostVault};

pub struct EngineFactory {
    store: Arc<dyn DataStore>,
    files: Arc<dyn FileStore>,
    policy: Arc<dyn ViewPolicy>,
    registry: Arc<FlagRegistry>,
    pseudonym_salt: String,
    missing: MissingPostPolicy,
}

impl EngineFactory {
    pub fn new(
        store: Arc<dyn DataStore>,
        files: Arc<dyn FileStore>,
        policy: Arc<dyn ViewPolicy>,
    ) -> Self {
        Self {
            store,
            files,
            policy,
            registry: Arc::new(FlagRegistry::default()),
            pseudonym_salt: "agora".to_string(),
            missing: MissingPostPolicy::default(),
        }
    }

    /// Replaces the default flag registry.
    pub fn with_registry(mut self, registry: FlagRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// Installation-specific salt for pseudonym derivation. Deployments
    /// should always set this.
    pub fn with_pseudonym_salt(mut self, salt: impl Into<String>) -> Self {
        self.pseudonym_salt = salt.into();
        self
    }

    /// Batch behavior for unresolvable posts.
    pub fn with_missing_post_policy(mut self, missing: MissingPostPolicy) -> Self {
        self.missing = missing;
        self
    }

    pub fn registry(&self) -> &FlagRegistry {
        &self.registry
    }

    pub fn export_builder(&self) -> ExportBuilder {
        ExportBuilder::new(
            DiscussionVault::new(self.store.clone()),
            PostVault::new(self.store.clone(), self.registry.clone()),
            AttachmentVault::new(self.files.clone()),
            AuthorVault::new(self.store.clone()),
            DiscussionExporter::new(PostExporter::new(
                self.policy.clone(),
                self.pseudonym_salt.clone(),
            )),
            self.missing,
        )
    }

    pub fn flag_manager(&self) -> FlagManager {
        FlagManager::new(self.store.clone(), self.registry.clone())
    }
}
