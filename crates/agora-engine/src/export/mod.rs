//! # Exporters
//!
//! Pure transforms from entities plus pre-assembled side data to
//! serializable bundles. Nothing here touches a vault or a store; the
//! builder hands everything in up front, and a missing side-data entry
//! degrades to an empty or neutral value.

mod discussion;
mod post;

pub use discussion::DiscussionExporter;
pub use post::PostExporter;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use agora_core::{Author, Group, MessageFormat, RatingSummary, StoredFile};

/// Side data assembled by the builder before any exporter runs, keyed by
/// post or author id.
#[derive(Debug, Default)]
pub struct SideData {
    pub authors: HashMap<Uuid, Author>,
    pub groups: HashMap<Uuid, Vec<Group>>,
    pub attachments: HashMap<Uuid, Vec<StoredFile>>,
    pub inline_files: HashMap<Uuid, Vec<StoredFile>>,
    pub tags: HashMap<Uuid, Vec<String>>,
    pub ratings: HashMap<Uuid, RatingSummary>,
}

/// Read-only projection of a discussion with its exported posts. Produced
/// once per request, never persisted. Field names are stable across calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedDiscussion {
    pub id: Uuid,
    pub forum_id: Uuid,
    pub name: String,
    pub pinned: bool,
    pub first_post_id: Uuid,
    pub posts: Vec<ExportedPost>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedPost {
    pub id: Uuid,
    pub discussion_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub author: ExportedAuthor,
    /// `None` when the body is withheld from this viewer.
    pub message: Option<String>,
    pub message_format: MessageFormat,
    pub is_private_reply: bool,
    /// Present only for viewers who can read the reply in full.
    pub private_reply_to: Option<Uuid>,
    pub flags: Vec<String>,
    pub tags: Vec<String>,
    pub attachments: Vec<ExportedFile>,
    pub inline_files: Vec<ExportedFile>,
    pub rating: Option<ExportedRating>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedAuthor {
    /// `None` when the identity is pseudonymized.
    pub id: Option<Uuid>,
    /// Real full name, or the stable pseudonym.
    pub full_name: String,
    pub groups: Vec<ExportedGroup>,
    pub anonymous: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedGroup {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedFile {
    pub filename: String,
    pub size: u64,
    pub mimetype: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExportedRating {
    pub count: u32,
    pub aggregate: f64,
}

/// Stable per-discussion pseudonym for an author.
///
/// Derived from (salt, author, discussion): one author keeps a single label
/// inside a discussion but cannot be correlated across discussions.
pub(crate) fn pseudonym(salt: &str, author_id: Uuid, discussion_id: Uuid) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(author_id.as_bytes());
    hasher.update(discussion_id.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("anon-{}", &digest[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pseudonym_is_stable_within_a_discussion() {
        let author = Uuid::now_v7();
        let discussion = Uuid::now_v7();
        assert_eq!(
            pseudonym("s", author, discussion),
            pseudonym("s", author, discussion)
        );
    }

    #[test]
    fn pseudonym_differs_across_discussions() {
        let author = Uuid::now_v7();
        let d1 = Uuid::now_v7();
        let d2 = Uuid::now_v7();
        assert_ne!(pseudonym("s", author, d1), pseudonym("s", author, d2));
    }
}
