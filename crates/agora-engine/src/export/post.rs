//! Post export: redaction and anonymization happen here, in one pass, from
//! data the builder already fetched.

use std::sync::Arc;

use uuid::Uuid;

use agora_core::{Forum, Post, StoredFile, ViewPolicy};

use super::{
    pseudonym, ExportedAuthor, ExportedFile, ExportedGroup, ExportedPost, ExportedRating, SideData,
};

pub struct PostExporter {
    policy: Arc<dyn ViewPolicy>,
    /// Engine-local salt feeding pseudonym derivation. Deployments supply
    /// their own so labels are not portable between installations.
    salt: String,
}

impl PostExporter {
    pub(crate) fn new(policy: Arc<dyn ViewPolicy>, salt: impl Into<String>) -> Self {
        Self {
            policy,
            salt: salt.into(),
        }
    }

    /// Exports `posts` as seen by `viewer`.
    pub fn export(
        &self,
        viewer: Uuid,
        forum: &Forum,
        posts: &[Post],
        side: &SideData,
    ) -> Vec<ExportedPost> {
        posts
            .iter()
            .map(|post| self.export_one(viewer, forum, post, side))
            .collect()
    }

    fn export_one(&self, viewer: Uuid, forum: &Forum, post: &Post, side: &SideData) -> ExportedPost {
        let full = self.can_read_in_full(viewer, post);
        ExportedPost {
            id: post.id,
            discussion_id: post.discussion_id,
            parent_id: post.parent_id,
            author: self.export_author(viewer, forum, post, side),
            message: full.then(|| post.message.clone()),
            message_format: post.message_format,
            is_private_reply: post.is_private_reply(),
            private_reply_to: if full { post.private_reply_to } else { None },
            flags: post.flags.as_slice().to_vec(),
            tags: side.tags.get(&post.id).cloned().unwrap_or_default(),
            attachments: exported_files(side.attachments.get(&post.id)),
            inline_files: exported_files(side.inline_files.get(&post.id)),
            rating: side.ratings.get(&post.id).map(|r| ExportedRating {
                count: r.count,
                aggregate: r.aggregate,
            }),
            created_at: post.created_at,
            modified_at: post.modified_at,
        }
    }

    /// A private reply is readable in full only by its author, its target,
    /// or a viewer the policy privileges. Everyone else still sees the
    /// post's metadata so the thread renders intact.
    fn can_read_in_full(&self, viewer: Uuid, post: &Post) -> bool {
        match post.private_reply_to {
            None => true,
            Some(target) => {
                viewer == post.author_id
                    || viewer == target
                    || self.policy.can_view_full_post(viewer, post)
            }
        }
    }

    fn export_author(
        &self,
        viewer: Uuid,
        forum: &Forum,
        post: &Post,
        side: &SideData,
    ) -> ExportedAuthor {
        let reveal = !forum.anonymous
            || viewer == post.author_id
            || self.policy.can_see_real_identity(viewer, forum);
        if !reveal {
            // Group badges are withheld too; they narrow identity.
            return ExportedAuthor {
                id: None,
                full_name: pseudonym(&self.salt, post.author_id, post.discussion_id),
                groups: Vec::new(),
                anonymous: true,
            };
        }
        match side.authors.get(&post.author_id) {
            Some(author) => ExportedAuthor {
                id: Some(author.id),
                full_name: author.full_name(),
                groups: side
                    .groups
                    .get(&author.id)
                    .map(|gs| {
                        gs.iter()
                            .map(|g| ExportedGroup {
                                id: g.id,
                                name: g.name.clone(),
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
                anonymous: false,
            },
            None => ExportedAuthor {
                id: Some(post.author_id),
                full_name: "Unknown user".to_string(),
                groups: Vec::new(),
                anonymous: false,
            },
        }
    }
}

fn exported_files(files: Option<&Vec<StoredFile>>) -> Vec<ExportedFile> {
    files
        .map(|fs| {
            fs.iter()
                .map(|f| ExportedFile {
                    filename: f.filename.clone(),
                    size: f.size,
                    mimetype: f.mimetype.clone(),
                    url: f.url.clone(),
                })
                .collect()
        })
        .unwrap_or_default()
}
