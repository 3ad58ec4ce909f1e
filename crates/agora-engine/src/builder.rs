//! # Export Builder
//!
//! Orchestrates one export operation: vault fetch, id derivation, a
//! concurrent side-data fan-out, then a single exporter pass. Data flows one
//! way; exporters never call back into vaults.

use std::collections::{HashMap, HashSet};

use tracing::warn;
use uuid::Uuid;

use agora_core::{EngineError, Forum, Post, Result};

use crate::export::{DiscussionExporter, ExportedDiscussion, ExportedPost, SideData};
use crate::vaults::{AttachmentVault, AuthorVault, DiscussionVault, PostVault};

/// What to do with a post whose linkage cannot be resolved (a reply whose
/// parent is not part of the same discussion). Chosen once at factory
/// construction; never silently mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingPostPolicy {
    /// Drop the post from the batch and log it.
    #[default]
    Skip,
    /// Fail the whole batch.
    Fail,
}

pub struct ExportBuilder {
    discussions: DiscussionVault,
    posts: PostVault,
    attachments: AttachmentVault,
    authors: AuthorVault,
    exporter: DiscussionExporter,
    missing: MissingPostPolicy,
}

impl ExportBuilder {
    pub(crate) fn new(
        discussions: DiscussionVault,
        posts: PostVault,
        attachments: AttachmentVault,
        authors: AuthorVault,
        exporter: DiscussionExporter,
        missing: MissingPostPolicy,
    ) -> Self {
        Self {
            discussions,
            posts,
            attachments,
            authors,
            exporter,
            missing,
        }
    }

    /// Exports one discussion with its full post tree.
    pub async fn discussion(
        &self,
        viewer: Uuid,
        discussion_id: Uuid,
    ) -> Result<ExportedDiscussion> {
        let discussion = self.discussions.fetch(discussion_id).await?;
        let forum = self.discussions.forum(discussion.forum_id).await?;
        let posts = self.screen(self.posts.in_discussion(discussion_id).await?)?;
        let side = self.side_data(&forum, &posts).await?;
        Ok(self
            .exporter
            .export(viewer, &forum, &discussion, &posts, &side))
    }

    /// Exports a page of a forum's discussions, each with its posts. All
    /// side data for the page is fetched in one fan-out.
    pub async fn forum(
        &self,
        viewer: Uuid,
        forum_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ExportedDiscussion>> {
        let forum = self.discussions.forum(forum_id).await?;
        let discussions = self.discussions.in_forum(forum_id, limit, offset).await?;
        let ids: Vec<Uuid> = discussions.iter().map(|d| d.id).collect();
        let posts = self.screen(self.posts.in_discussions(&ids).await?)?;
        let side = self.side_data(&forum, &posts).await?;

        let mut by_discussion: HashMap<Uuid, Vec<Post>> = HashMap::new();
        for post in posts {
            by_discussion.entry(post.discussion_id).or_default().push(post);
        }
        Ok(discussions
            .into_iter()
            .map(|d| {
                let posts = by_discussion.remove(&d.id).unwrap_or_default();
                self.exporter.export(viewer, &forum, &d, &posts, &side)
            })
            .collect())
    }

    /// Exports one author's posts across a forum.
    pub async fn posts_by_author(
        &self,
        viewer: Uuid,
        forum_id: Uuid,
        author_id: Uuid,
    ) -> Result<Vec<ExportedPost>> {
        let forum = self.discussions.forum(forum_id).await?;
        let posts = self.posts.by_author(forum_id, author_id).await?;
        let side = self.side_data(&forum, &posts).await?;
        Ok(self.exporter.posts().export(viewer, &forum, &posts, &side))
    }

    /// The side lookups are independent reads over disjoint id sets: fan
    /// them out together and join before any exporter runs.
    async fn side_data(&self, forum: &Forum, posts: &[Post]) -> Result<SideData> {
        let post_ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
        let mut author_ids: Vec<Uuid> = Vec::new();
        let mut seen = HashSet::new();
        for post in posts {
            if seen.insert(post.author_id) {
                author_ids.push(post.author_id);
            }
        }

        let (authors, groups, attachments, inline_files, tags, ratings) = tokio::try_join!(
            self.authors.by_ids(&author_ids),
            self.authors.groups(forum.course_id, &author_ids),
            self.attachments
                .attachments_for_posts(forum.context_id, &post_ids),
            self.attachments
                .inline_files_for_posts(forum.context_id, &post_ids),
            self.posts.tags(&post_ids),
            self.posts.ratings(&post_ids),
        )?;

        Ok(SideData {
            authors,
            groups,
            attachments,
            inline_files,
            tags,
            ratings,
        })
    }

    /// Applies the missing-post policy to replies whose parent is not part
    /// of the fetched set for their discussion.
    fn screen(&self, posts: Vec<Post>) -> Result<Vec<Post>> {
        let known: HashSet<(Uuid, Uuid)> =
            posts.iter().map(|p| (p.discussion_id, p.id)).collect();
        let mut kept = Vec::with_capacity(posts.len());
        for post in posts {
            let resolvable = match post.parent_id {
                None => true,
                Some(parent) => known.contains(&(post.discussion_id, parent)),
            };
            if resolvable {
                kept.push(post);
                continue;
            }
            match self.missing {
                MissingPostPolicy::Skip => {
                    warn!(post = %post.id, discussion = %post.discussion_id, "dropping reply with unresolvable parent");
                }
                MissingPostPolicy::Fail => {
                    return Err(EngineError::Corrupt(format!(
                        "post {} references a parent outside discussion {}",
                        post.id, post.discussion_id
                    )));
                }
            }
        }
        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use uuid::Uuid;

    use agora_core::{
        AuthorRecord, DiscussionRecord, FileArea, FileRecord, ForumRecord, PostRecord, TagRecord,
        ViewPolicy,
    };
    use agora_store_memory::MemoryStore;

    use super::*;
    use crate::factory::EngineFactory;

    struct NoPrivileges;

    impl ViewPolicy for NoPrivileges {
        fn can_view_full_post(&self, _viewer: Uuid, _post: &agora_core::Post) -> bool {
            false
        }
        fn can_see_real_identity(&self, _viewer: Uuid, _forum: &Forum) -> bool {
            false
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        forum_id: Uuid,
        context_id: Uuid,
        discussion_id: Uuid,
        author_id: Uuid,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let forum_id = Uuid::now_v7();
        let course_id = Uuid::now_v7();
        let context_id = Uuid::now_v7();
        let discussion_id = Uuid::now_v7();
        let author_id = Uuid::now_v7();

        store.insert_forum(ForumRecord {
            id: forum_id,
            course_id,
            name: "General".into(),
            anonymous: false,
            context_id,
        });
        store.insert_author(AuthorRecord {
            id: author_id,
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            context_id,
        });

        Fixture {
            store,
            forum_id,
            context_id,
            discussion_id,
            author_id,
        }
    }

    fn discussion(fx: &Fixture, first_post_id: Uuid) -> DiscussionRecord {
        DiscussionRecord {
            id: fx.discussion_id,
            forum_id: fx.forum_id,
            name: "Week 1".into(),
            pinned: false,
            first_post_id,
        }
    }

    fn post(fx: &Fixture, parent_id: Option<Uuid>) -> PostRecord {
        PostRecord {
            id: Uuid::now_v7(),
            discussion_id: fx.discussion_id,
            parent_id,
            author_id: fx.author_id,
            message: "hello".into(),
            message_format: "html".into(),
            flags: None,
            private_reply_to: None,
            created_at: Utc::now(),
            modified_at: Utc::now(),
        }
    }

    fn factory(fx: &Fixture) -> EngineFactory {
        EngineFactory::new(fx.store.clone(), fx.store.clone(), Arc::new(NoPrivileges))
    }

    #[tokio::test]
    async fn exports_a_discussion_with_sparse_side_data() {
        let fx = fixture();
        let first = post(&fx, None);
        let root_id = first.id;
        let second = post(&fx, Some(root_id));
        let third = post(&fx, Some(root_id));
        fx.store.insert_discussion(discussion(&fx, root_id));

        // Attachments and tags only on posts 1 and 3; post 2 has neither.
        for p in [&first, &third] {
            fx.store.insert_file(
                fx.context_id,
                "agora",
                FileRecord {
                    item_id: p.id,
                    area: FileArea::Attachment,
                    filename: "notes.txt".into(),
                    size: 10,
                    mimetype: "text/plain".into(),
                    url: "/files/notes.txt".into(),
                    is_directory: false,
                },
            );
            fx.store.insert_tag(TagRecord {
                post_id: p.id,
                name: "rust".into(),
            });
        }
        let bare_id = second.id;
        for p in [first, second, third] {
            fx.store.insert_post(p);
        }

        let builder = factory(&fx).export_builder();
        let bundle = builder
            .discussion(Uuid::now_v7(), fx.discussion_id)
            .await
            .unwrap();

        assert_eq!(bundle.posts.len(), 3);
        let bare = bundle.posts.iter().find(|p| p.id == bare_id).unwrap();
        assert!(bare.attachments.is_empty());
        assert!(bare.tags.is_empty());
        for p in bundle.posts.iter().filter(|p| p.id != bare_id) {
            assert_eq!(p.attachments.len(), 1);
            assert_eq!(p.tags, vec!["rust".to_string()]);
        }
    }

    #[tokio::test]
    async fn skip_policy_drops_orphan_replies() {
        let fx = fixture();
        let root = post(&fx, None);
        let root_id = root.id;
        let orphan = post(&fx, Some(Uuid::now_v7()));
        let orphan_id = orphan.id;
        fx.store.insert_discussion(discussion(&fx, root_id));
        fx.store.insert_post(root);
        fx.store.insert_post(orphan);

        let builder = factory(&fx).export_builder();
        let bundle = builder
            .discussion(Uuid::now_v7(), fx.discussion_id)
            .await
            .unwrap();

        assert_eq!(bundle.posts.len(), 1);
        assert!(bundle.posts.iter().all(|p| p.id != orphan_id));
    }

    #[tokio::test]
    async fn fail_policy_rejects_the_whole_batch() {
        let fx = fixture();
        let root = post(&fx, None);
        let root_id = root.id;
        let orphan = post(&fx, Some(Uuid::now_v7()));
        fx.store.insert_discussion(discussion(&fx, root_id));
        fx.store.insert_post(root);
        fx.store.insert_post(orphan);

        let builder = factory(&fx)
            .with_missing_post_policy(MissingPostPolicy::Fail)
            .export_builder();
        let err = builder
            .discussion(Uuid::now_v7(), fx.discussion_id)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Corrupt(_)));
    }

    #[tokio::test]
    async fn missing_discussion_is_not_found() {
        let fx = fixture();
        let builder = factory(&fx).export_builder();
        let err = builder
            .discussion(Uuid::now_v7(), Uuid::now_v7())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { kind: "discussion", .. }));
    }

    #[tokio::test]
    async fn forum_export_groups_posts_per_discussion() {
        let fx = fixture();
        let root = post(&fx, None);
        let root_id = root.id;
        fx.store.insert_discussion(discussion(&fx, root_id));
        fx.store.insert_post(root);

        let empty_discussion = Uuid::now_v7();
        fx.store.insert_discussion(DiscussionRecord {
            id: empty_discussion,
            forum_id: fx.forum_id,
            name: "Quiet".into(),
            pinned: false,
            first_post_id: Uuid::now_v7(),
        });

        let builder = factory(&fx).export_builder();
        let bundles = builder
            .forum(Uuid::now_v7(), fx.forum_id, 10, 0)
            .await
            .unwrap();

        assert_eq!(bundles.len(), 2);
        let full = bundles.iter().find(|b| b.id == fx.discussion_id).unwrap();
        let quiet = bundles.iter().find(|b| b.id == empty_discussion).unwrap();
        assert_eq!(full.posts.len(), 1);
        assert!(quiet.posts.is_empty());
    }

    #[tokio::test]
    async fn author_export_spans_the_forum() {
        let fx = fixture();
        let root = post(&fx, None);
        let root_id = root.id;
        fx.store.insert_discussion(discussion(&fx, root_id));
        fx.store.insert_post(root);

        let builder = factory(&fx).export_builder();
        let posts = builder
            .posts_by_author(Uuid::now_v7(), fx.forum_id, fx.author_id)
            .await
            .unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].author.full_name, "Ada Lovelace");
    }
}
