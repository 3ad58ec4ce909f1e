//! Read access to forums and discussions.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use agora_core::{
    DataStore, Discussion, DiscussionRecord, EngineError, Forum, ForumRecord, Result,
};

pub struct DiscussionVault {
    store: Arc<dyn DataStore>,
}

impl DiscussionVault {
    pub(crate) fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Fetches one forum or fails with `NotFound`.
    pub async fn forum(&self, id: Uuid) -> Result<Forum> {
        let record = self
            .store
            .forum(id)
            .await?
            .ok_or_else(|| EngineError::not_found("forum", id))?;
        Ok(map_forum(record))
    }

    /// Fetches one discussion or fails with `NotFound`.
    pub async fn fetch(&self, id: Uuid) -> Result<Discussion> {
        let record = self
            .store
            .discussion(id)
            .await?
            .ok_or_else(|| EngineError::not_found("discussion", id))?;
        Ok(map_discussion(record))
    }

    /// A page of a forum's discussions. Fails with `NotFound` when the forum
    /// itself is absent; an empty forum yields an empty list.
    pub async fn in_forum(
        &self,
        forum_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Discussion>> {
        if self.store.forum(forum_id).await?.is_none() {
            return Err(EngineError::not_found("forum", forum_id));
        }
        let records = self
            .store
            .discussions_in_forum(forum_id, limit, offset)
            .await?;
        debug!(forum = %forum_id, count = records.len(), "fetched discussions");
        Ok(records.into_iter().map(map_discussion).collect())
    }
}

fn map_forum(record: ForumRecord) -> Forum {
    Forum {
        id: record.id,
        course_id: record.course_id,
        name: record.name,
        anonymous: record.anonymous,
        context_id: record.context_id,
    }
}

fn map_discussion(record: DiscussionRecord) -> Discussion {
    Discussion {
        id: record.id,
        forum_id: record.forum_id,
        name: record.name,
        pinned: record.pinned,
        first_post_id: record.first_post_id,
    }
}
