//! # Domain Models
//!
//! These structs represent the core entities of the Agora engine.
//! We use UUID v7 for time-ordered, globally unique identification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::flags::FlagSet;

/// A forum: the container for discussions within one course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forum {
    pub id: Uuid,
    pub course_id: Uuid,
    pub name: String,
    /// When set, author identities are pseudonymized on export.
    pub anonymous: bool,
    /// Scope handle used for file-store lookups.
    pub context_id: Uuid,
}

/// A Discussion groups a tree of Posts under one forum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discussion {
    pub id: Uuid,
    pub forum_id: Uuid,
    pub name: String,
    pub pinned: bool,
    pub first_post_id: Uuid,
}

/// The fundamental unit of conversation.
///
/// Invariant: a non-root `parent_id` references a post in the same
/// discussion. Posts are never physically deleted; lifecycle state lives in
/// `flags`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub discussion_id: Uuid,
    /// `None` for the root post of a discussion.
    pub parent_id: Option<Uuid>,
    pub author_id: Uuid,
    pub message: String,
    pub message_format: MessageFormat,
    pub flags: FlagSet,
    /// When set, the message body is visible only to the author and this
    /// target user.
    pub private_reply_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Post {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_private_reply(&self) -> bool {
        self.private_reply_to.is_some()
    }
}

/// Rendering format of a post body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageFormat {
    Html,
    Markdown,
    Plain,
}

impl MessageFormat {
    /// Decodes the stored representation. Unknown values fall back to HTML,
    /// the dominant format in practice.
    pub fn from_storage(raw: &str) -> Self {
        match raw {
            "markdown" | "md" => Self::Markdown,
            "plain" | "text" => Self::Plain,
            _ => Self::Html,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Markdown => "markdown",
            Self::Plain => "plain",
        }
    }
}

/// A posting user. Group membership is side data keyed by author id, not a
/// field here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    /// Capability scope the author was fetched under.
    pub context_id: Uuid,
}

impl Author {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A group an author belongs to within a forum's course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: Uuid,
    pub name: String,
}

/// File areas recognized by the file store. `Post` holds files embedded in
/// the message body, `Attachment` holds uploads proper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileArea {
    Attachment,
    Post,
}

impl FileArea {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attachment => "attachment",
            Self::Post => "post",
        }
    }
}

/// A stored file reference, as surfaced to exporters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    /// Owning post.
    pub item_id: Uuid,
    pub area: FileArea,
    pub filename: String,
    pub size: u64,
    pub mimetype: String,
    pub url: String,
}

/// Aggregate rating over one post.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub count: u32,
    pub aggregate: f64,
}
