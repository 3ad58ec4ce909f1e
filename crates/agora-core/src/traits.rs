//! # Collaborator Ports
//!
//! External collaborators of the engine, injected as trait objects at
//! construction. The records defined here are storage-shaped: this is the
//! only layer where a packed flag string or a nullable parent column appears.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{FileArea, Forum, Post};

/// Storage row for a forum.
#[derive(Debug, Clone)]
pub struct ForumRecord {
    pub id: Uuid,
    pub course_id: Uuid,
    pub name: String,
    pub anonymous: bool,
    pub context_id: Uuid,
}

/// Storage row for a discussion.
#[derive(Debug, Clone)]
pub struct DiscussionRecord {
    pub id: Uuid,
    pub forum_id: Uuid,
    pub name: String,
    pub pinned: bool,
    pub first_post_id: Uuid,
}

/// Storage row for a post. `flags` is the packed comma-joined field;
/// `parent_id` is NULL for roots.
#[derive(Debug, Clone)]
pub struct PostRecord {
    pub id: Uuid,
    pub discussion_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub author_id: Uuid,
    pub message: String,
    pub message_format: String,
    pub flags: Option<String>,
    pub private_reply_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Storage row for an author.
#[derive(Debug, Clone)]
pub struct AuthorRecord {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub context_id: Uuid,
}

/// One author's membership in one group.
#[derive(Debug, Clone)]
pub struct GroupMembershipRecord {
    pub author_id: Uuid,
    pub group_id: Uuid,
    pub group_name: String,
}

/// One tag on one post.
#[derive(Debug, Clone)]
pub struct TagRecord {
    pub post_id: Uuid,
    pub name: String,
}

/// Aggregate rating row for one post.
#[derive(Debug, Clone)]
pub struct RatingRecord {
    pub post_id: Uuid,
    pub count: i64,
    pub aggregate: f64,
}

/// A file row as returned by the file store.
#[derive(Debug, Clone)]
pub struct FileRecord {
    /// Owning item (post) id.
    pub item_id: Uuid,
    pub area: FileArea,
    pub filename: String,
    pub size: i64,
    pub mimetype: String,
    pub url: String,
    pub is_directory: bool,
}

/// Persistence contract for forums, discussions, posts, and their side data.
///
/// Read methods are batched where the caller holds a set of ids; an empty
/// result is a valid outcome, never an error. Each call is assumed
/// transactional on the store side; no call spans an export operation.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn forum(&self, id: Uuid) -> anyhow::Result<Option<ForumRecord>>;

    async fn discussion(&self, id: Uuid) -> anyhow::Result<Option<DiscussionRecord>>;

    async fn discussions_in_forum(
        &self,
        forum_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<DiscussionRecord>>;

    async fn post(&self, id: Uuid) -> anyhow::Result<Option<PostRecord>>;

    async fn posts_in_discussions(
        &self,
        discussion_ids: &[Uuid],
    ) -> anyhow::Result<Vec<PostRecord>>;

    async fn posts_by_author(
        &self,
        forum_id: Uuid,
        author_id: Uuid,
    ) -> anyhow::Result<Vec<PostRecord>>;

    async fn authors(&self, ids: &[Uuid]) -> anyhow::Result<Vec<AuthorRecord>>;

    async fn group_memberships(
        &self,
        course_id: Uuid,
        author_ids: &[Uuid],
    ) -> anyhow::Result<Vec<GroupMembershipRecord>>;

    async fn tags_for_posts(&self, post_ids: &[Uuid]) -> anyhow::Result<Vec<TagRecord>>;

    async fn ratings_for_posts(&self, post_ids: &[Uuid]) -> anyhow::Result<Vec<RatingRecord>>;

    /// The single write path of the engine: replaces one post's packed flag
    /// field. Last write wins.
    async fn update_post_flags(&self, post_id: Uuid, flags: Option<String>)
        -> anyhow::Result<()>;
}

/// File storage contract. One call fetches every file in `area` owned by any
/// of `item_ids` under the given context and component namespace.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn area_files(
        &self,
        context_id: Uuid,
        component: &str,
        area: FileArea,
        item_ids: &[Uuid],
        include_dirs: bool,
    ) -> anyhow::Result<Vec<FileRecord>>;
}

/// Per-viewer capability decisions, supplied by the host application.
/// The engine consumes these as booleans; it never computes permissions.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait ViewPolicy: Send + Sync {
    /// Whether `viewer` may read a post's full body regardless of
    /// private-reply targeting.
    fn can_view_full_post(&self, viewer: Uuid, post: &Post) -> bool;

    /// Whether `viewer` sees real identities in an anonymous forum.
    fn can_see_real_identity(&self, viewer: Uuid, forum: &Forum) -> bool;
}
