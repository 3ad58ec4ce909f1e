//! Flag toggling against the store.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use agora_core::{DataStore, EngineError, FlagRegistry, FlagSet, Result};

/// Owns the engine's single write path: read one post's packed flag field,
/// flip in memory, write the re-encoded field back in one update. Last write
/// wins; there is no optimistic concurrency on this column.
pub struct FlagManager {
    store: Arc<dyn DataStore>,
    registry: Arc<FlagRegistry>,
}

impl FlagManager {
    pub(crate) fn new(store: Arc<dyn DataStore>, registry: Arc<FlagRegistry>) -> Self {
        Self { store, registry }
    }

    /// Toggles `flag` on a post and persists the result. Returns the post's
    /// new flag set. Unknown stored tokens are cleaned out by the rewrite.
    pub async fn toggle(&self, post_id: Uuid, flag: &str) -> Result<FlagSet> {
        let record = self
            .store
            .post(post_id)
            .await?
            .ok_or_else(|| EngineError::not_found("post", post_id))?;
        let set = self.registry.toggle(record.flags.as_deref(), flag)?;
        debug!(post = %post_id, flag, flags = ?set.as_slice(), "toggled flag");
        self.store.update_post_flags(post_id, set.to_field()).await?;
        Ok(set)
    }

    /// Whether `flag` is currently set on a post.
    pub async fn is_flagged(&self, post_id: Uuid, flag: &str) -> Result<bool> {
        let record = self
            .store
            .post(post_id)
            .await?
            .ok_or_else(|| EngineError::not_found("post", post_id))?;
        self.registry.is_flagged(record.flags.as_deref(), flag)
    }
}
