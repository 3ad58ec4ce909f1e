//! Discussion export: a thin projection over the post exporter.

use uuid::Uuid;

use agora_core::{Discussion, Forum, Post};

use super::{ExportedDiscussion, PostExporter, SideData};

pub struct DiscussionExporter {
    posts: PostExporter,
}

impl DiscussionExporter {
    pub(crate) fn new(posts: PostExporter) -> Self {
        Self { posts }
    }

    pub fn posts(&self) -> &PostExporter {
        &self.posts
    }

    /// Exports one discussion with the posts the builder fetched for it.
    pub fn export(
        &self,
        viewer: Uuid,
        forum: &Forum,
        discussion: &Discussion,
        posts: &[Post],
        side: &SideData,
    ) -> ExportedDiscussion {
        ExportedDiscussion {
            id: discussion.id,
            forum_id: discussion.forum_id,
            name: discussion.name.clone(),
            pinned: discussion.pinned,
            first_post_id: discussion.first_post_id,
            posts: self.posts.export(viewer, forum, posts, side),
        }
    }
}
