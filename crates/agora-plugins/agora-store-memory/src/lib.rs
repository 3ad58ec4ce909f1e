//! # agora-store-memory
//!
//! In-memory implementation of the `DataStore` and `FileStore` ports, for
//! tests and demo assemblies. Seeded up front through the `insert_*`
//! methods; the one engine write path (`update_post_flags`) takes the same
//! lock as everything else.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::anyhow;
use async_trait::async_trait;
use uuid::Uuid;

use agora_core::{
    AuthorRecord, DataStore, DiscussionRecord, FileArea, FileRecord, FileStore, ForumRecord,
    GroupMembershipRecord, PostRecord, RatingRecord, TagRecord,
};

#[derive(Default)]
struct State {
    forums: HashMap<Uuid, ForumRecord>,
    discussions: HashMap<Uuid, DiscussionRecord>,
    posts: HashMap<Uuid, PostRecord>,
    authors: HashMap<Uuid, AuthorRecord>,
    // (course_id, membership)
    memberships: Vec<(Uuid, GroupMembershipRecord)>,
    tags: Vec<TagRecord>,
    ratings: Vec<RatingRecord>,
    // (context_id, component, file)
    files: Vec<(Uuid, String, FileRecord)>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_forum(&self, record: ForumRecord) {
        self.inner.write().unwrap().forums.insert(record.id, record);
    }

    pub fn insert_discussion(&self, record: DiscussionRecord) {
        self.inner
            .write()
            .unwrap()
            .discussions
            .insert(record.id, record);
    }

    pub fn insert_post(&self, record: PostRecord) {
        self.inner.write().unwrap().posts.insert(record.id, record);
    }

    pub fn insert_author(&self, record: AuthorRecord) {
        self.inner.write().unwrap().authors.insert(record.id, record);
    }

    pub fn insert_membership(&self, course_id: Uuid, record: GroupMembershipRecord) {
        self.inner
            .write()
            .unwrap()
            .memberships
            .push((course_id, record));
    }

    pub fn insert_tag(&self, record: TagRecord) {
        self.inner.write().unwrap().tags.push(record);
    }

    pub fn insert_rating(&self, record: RatingRecord) {
        self.inner.write().unwrap().ratings.push(record);
    }

    pub fn insert_file(&self, context_id: Uuid, component: &str, record: FileRecord) {
        self.inner
            .write()
            .unwrap()
            .files
            .push((context_id, component.to_string(), record));
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn forum(&self, id: Uuid) -> anyhow::Result<Option<ForumRecord>> {
        Ok(self.inner.read().unwrap().forums.get(&id).cloned())
    }

    async fn discussion(&self, id: Uuid) -> anyhow::Result<Option<DiscussionRecord>> {
        Ok(self.inner.read().unwrap().discussions.get(&id).cloned())
    }

    async fn discussions_in_forum(
        &self,
        forum_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<DiscussionRecord>> {
        let state = self.inner.read().unwrap();
        let mut out: Vec<DiscussionRecord> = state
            .discussions
            .values()
            .filter(|d| d.forum_id == forum_id)
            .cloned()
            .collect();
        // Pinned first, then id order (v7 ids sort by creation time).
        out.sort_by(|a, b| b.pinned.cmp(&a.pinned).then(a.id.cmp(&b.id)));
        Ok(out
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn post(&self, id: Uuid) -> anyhow::Result<Option<PostRecord>> {
        Ok(self.inner.read().unwrap().posts.get(&id).cloned())
    }

    async fn posts_in_discussions(
        &self,
        discussion_ids: &[Uuid],
    ) -> anyhow::Result<Vec<PostRecord>> {
        let state = self.inner.read().unwrap();
        let mut out: Vec<PostRecord> = state
            .posts
            .values()
            .filter(|p| discussion_ids.contains(&p.discussion_id))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    async fn posts_by_author(
        &self,
        forum_id: Uuid,
        author_id: Uuid,
    ) -> anyhow::Result<Vec<PostRecord>> {
        let state = self.inner.read().unwrap();
        let mut out: Vec<PostRecord> = state
            .posts
            .values()
            .filter(|p| {
                p.author_id == author_id
                    && state
                        .discussions
                        .get(&p.discussion_id)
                        .is_some_and(|d| d.forum_id == forum_id)
            })
            .cloned()
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    async fn authors(&self, ids: &[Uuid]) -> anyhow::Result<Vec<AuthorRecord>> {
        let state = self.inner.read().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| state.authors.get(id).cloned())
            .collect())
    }

    async fn group_memberships(
        &self,
        course_id: Uuid,
        author_ids: &[Uuid],
    ) -> anyhow::Result<Vec<GroupMembershipRecord>> {
        let state = self.inner.read().unwrap();
        Ok(state
            .memberships
            .iter()
            .filter(|(course, m)| *course == course_id && author_ids.contains(&m.author_id))
            .map(|(_, m)| m.clone())
            .collect())
    }

    async fn tags_for_posts(&self, post_ids: &[Uuid]) -> anyhow::Result<Vec<TagRecord>> {
        let state = self.inner.read().unwrap();
        Ok(state
            .tags
            .iter()
            .filter(|t| post_ids.contains(&t.post_id))
            .cloned()
            .collect())
    }

    async fn ratings_for_posts(&self, post_ids: &[Uuid]) -> anyhow::Result<Vec<RatingRecord>> {
        let state = self.inner.read().unwrap();
        Ok(state
            .ratings
            .iter()
            .filter(|r| post_ids.contains(&r.post_id))
            .cloned()
            .collect())
    }

    async fn update_post_flags(
        &self,
        post_id: Uuid,
        flags: Option<String>,
    ) -> anyhow::Result<()> {
        let mut state = self.inner.write().unwrap();
        let post = state
            .posts
            .get_mut(&post_id)
            .ok_or_else(|| anyhow!("post {post_id} not found"))?;
        post.flags = flags;
        Ok(())
    }
}

#[async_trait]
impl FileStore for MemoryStore {
    async fn area_files(
        &self,
        context_id: Uuid,
        component: &str,
        area: FileArea,
        item_ids: &[Uuid],
        include_dirs: bool,
    ) -> anyhow::Result<Vec<FileRecord>> {
        let state = self.inner.read().unwrap();
        Ok(state
            .files
            .iter()
            .filter(|(ctx, comp, f)| {
                *ctx == context_id
                    && comp == component
                    && f.area == area
                    && item_ids.contains(&f.item_id)
                    && (include_dirs || !f.is_directory)
            })
            .map(|(_, _, f)| f.clone())
            .collect())
    }
}
