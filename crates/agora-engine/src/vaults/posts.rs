//! Read access to posts and their post-keyed side data (tags, ratings).

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use agora_core::{
    DataStore, EngineError, FlagRegistry, MessageFormat, Post, PostRecord, RatingSummary, Result,
};

pub struct PostVault {
    store: Arc<dyn DataStore>,
    registry: Arc<FlagRegistry>,
}

impl PostVault {
    pub(crate) fn new(store: Arc<dyn DataStore>, registry: Arc<FlagRegistry>) -> Self {
        Self { store, registry }
    }

    /// Fetches one post or fails with `NotFound`.
    pub async fn fetch(&self, id: Uuid) -> Result<Post> {
        let record = self
            .store
            .post(id)
            .await?
            .ok_or_else(|| EngineError::not_found("post", id))?;
        Ok(self.map_post(record))
    }

    pub async fn in_discussion(&self, discussion_id: Uuid) -> Result<Vec<Post>> {
        self.in_discussions(&[discussion_id]).await
    }

    /// All posts across a set of discussions, in creation order. An empty id
    /// set short-circuits without touching the store.
    pub async fn in_discussions(&self, discussion_ids: &[Uuid]) -> Result<Vec<Post>> {
        if discussion_ids.is_empty() {
            return Ok(Vec::new());
        }
        let records = self.store.posts_in_discussions(discussion_ids).await?;
        debug!(
            discussions = discussion_ids.len(),
            posts = records.len(),
            "fetched posts"
        );
        Ok(records.into_iter().map(|r| self.map_post(r)).collect())
    }

    /// One author's posts across a forum.
    pub async fn by_author(&self, forum_id: Uuid, author_id: Uuid) -> Result<Vec<Post>> {
        let records = self.store.posts_by_author(forum_id, author_id).await?;
        Ok(records.into_iter().map(|r| self.map_post(r)).collect())
    }

    /// Tag names per post. Every requested id has an entry, empty when the
    /// post is untagged.
    pub async fn tags(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<String>>> {
        let mut map: HashMap<Uuid, Vec<String>> =
            post_ids.iter().map(|id| (*id, Vec::new())).collect();
        if post_ids.is_empty() {
            return Ok(map);
        }
        for record in self.store.tags_for_posts(post_ids).await? {
            if let Some(bucket) = map.get_mut(&record.post_id) {
                bucket.push(record.name);
            }
        }
        Ok(map)
    }

    /// Aggregate ratings keyed by post id. Unrated posts have no entry;
    /// exporters degrade them to a neutral value.
    pub async fn ratings(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, RatingSummary>> {
        if post_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let records = self.store.ratings_for_posts(post_ids).await?;
        Ok(records
            .into_iter()
            .map(|r| {
                (
                    r.post_id,
                    RatingSummary {
                        count: r.count.max(0) as u32,
                        aggregate: r.aggregate,
                    },
                )
            })
            .collect())
    }

    fn map_post(&self, record: PostRecord) -> Post {
        Post {
            id: record.id,
            discussion_id: record.discussion_id,
            parent_id: record.parent_id,
            author_id: record.author_id,
            message: record.message,
            message_format: MessageFormat::from_storage(&record.message_format),
            flags: self.registry.parse(record.flags.as_deref()),
            private_reply_to: record.private_reply_to,
            created_at: record.created_at,
            modified_at: record.modified_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::{MockDataStore, TagRecord};
    use chrono::Utc;

    fn record(discussion_id: Uuid, flags: Option<&str>) -> PostRecord {
        PostRecord {
            id: Uuid::now_v7(),
            discussion_id,
            parent_id: None,
            author_id: Uuid::now_v7(),
            message: "hello".into(),
            message_format: "html".into(),
            flags: flags.map(String::from),
            private_reply_to: None,
            created_at: Utc::now(),
            modified_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn flags_are_parsed_and_cleaned_on_read() {
        let discussion_id = Uuid::now_v7();
        let rec = record(discussion_id, Some("ghost,bookmark,bookmark"));
        let mut store = MockDataStore::new();
        store
            .expect_posts_in_discussions()
            .returning(move |_| Ok(vec![rec.clone()]));
        let vault = PostVault::new(Arc::new(store), Arc::new(FlagRegistry::default()));

        let posts = vault.in_discussion(discussion_id).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert!(posts[0].flags.contains("bookmark"));
        assert!(!posts[0].flags.contains("ghost"));
        assert_eq!(posts[0].flags.len(), 1);
    }

    #[tokio::test]
    async fn empty_discussion_set_skips_the_store() {
        // No expectations: any store call would panic the mock.
        let store = MockDataStore::new();
        let vault = PostVault::new(Arc::new(store), Arc::new(FlagRegistry::default()));

        let posts = vault.in_discussions(&[]).await.unwrap();
        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn missing_post_is_not_found() {
        let mut store = MockDataStore::new();
        store.expect_post().returning(|_| Ok(None));
        let vault = PostVault::new(Arc::new(store), Arc::new(FlagRegistry::default()));

        let err = vault.fetch(Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound { kind: "post", .. }));
    }

    #[tokio::test]
    async fn tags_map_has_entry_for_every_requested_id() {
        let tagged = Uuid::now_v7();
        let untagged = Uuid::now_v7();
        let mut store = MockDataStore::new();
        store.expect_tags_for_posts().returning(move |_| {
            Ok(vec![TagRecord {
                post_id: tagged,
                name: "rust".into(),
            }])
        });
        let vault = PostVault::new(Arc::new(store), Arc::new(FlagRegistry::default()));

        let tags = vault.tags(&[tagged, untagged]).await.unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[&tagged], vec!["rust".to_string()]);
        assert!(tags[&untagged].is_empty());
    }
}
