//! # agora-store-sqlite
//!
//! This module implements the data mapping between the SQLite relational
//! model and the `agora-core` storage records. The host application owns all
//! writes except the packed flag column; this plugin is a read surface plus
//! that one update.

use async_trait::async_trait;
use sqlx::{sqlite::SqlitePool, Row};
use uuid::Uuid;

use agora_core::{
    AuthorRecord, DataStore, DiscussionRecord, ForumRecord, GroupMembershipRecord, PostRecord,
    RatingRecord, TagRecord,
};

pub struct SqliteDataStore {
    pool: SqlitePool,
}

// UUIDs are stored as 16-byte BLOBs.
// TODO: lean on sqlx's sqlite uuid codec instead of manual blobs once we
// move past sqlx 0.7.
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> Uuid {
    Uuid::from_slice(blob).unwrap_or_default()
}

fn opt_blob_to_uuid(blob: Option<Vec<u8>>) -> Option<Uuid> {
    blob.map(|b| blob_to_uuid(&b))
}

/// `?` placeholders for an `IN (...)` list.
fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS forums (
        id BLOB PRIMARY KEY,
        course_id BLOB NOT NULL,
        name TEXT NOT NULL,
        anonymous INTEGER NOT NULL DEFAULT 0,
        context_id BLOB NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS discussions (
        id BLOB PRIMARY KEY,
        forum_id BLOB NOT NULL,
        name TEXT NOT NULL,
        pinned INTEGER NOT NULL DEFAULT 0,
        first_post_id BLOB NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS posts (
        id BLOB PRIMARY KEY,
        discussion_id BLOB NOT NULL,
        parent_id BLOB,
        author_id BLOB NOT NULL,
        message TEXT NOT NULL,
        message_format TEXT NOT NULL DEFAULT 'html',
        flags TEXT,
        private_reply_to BLOB,
        created_at TEXT NOT NULL,
        modified_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS authors (
        id BLOB PRIMARY KEY,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        context_id BLOB NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS group_memberships (
        course_id BLOB NOT NULL,
        author_id BLOB NOT NULL,
        group_id BLOB NOT NULL,
        group_name TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS post_tags (
        post_id BLOB NOT NULL,
        name TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS post_ratings (
        post_id BLOB PRIMARY KEY,
        count INTEGER NOT NULL,
        aggregate REAL NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_discussions_forum ON discussions (forum_id)",
    "CREATE INDEX IF NOT EXISTS idx_posts_discussion ON posts (discussion_id)",
];

impl SqliteDataStore {
    /// Connects and bootstraps the schema.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let pool = SqlitePool::connect(url).await?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn map_forum(row: &sqlx::sqlite::SqliteRow) -> ForumRecord {
    ForumRecord {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        course_id: blob_to_uuid(row.get::<Vec<u8>, _>("course_id").as_slice()),
        name: row.get("name"),
        anonymous: row.get("anonymous"),
        context_id: blob_to_uuid(row.get::<Vec<u8>, _>("context_id").as_slice()),
    }
}

fn map_discussion(row: &sqlx::sqlite::SqliteRow) -> DiscussionRecord {
    DiscussionRecord {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        forum_id: blob_to_uuid(row.get::<Vec<u8>, _>("forum_id").as_slice()),
        name: row.get("name"),
        pinned: row.get("pinned"),
        first_post_id: blob_to_uuid(row.get::<Vec<u8>, _>("first_post_id").as_slice()),
    }
}

fn map_post(row: &sqlx::sqlite::SqliteRow) -> PostRecord {
    PostRecord {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        discussion_id: blob_to_uuid(row.get::<Vec<u8>, _>("discussion_id").as_slice()),
        parent_id: opt_blob_to_uuid(row.get::<Option<Vec<u8>>, _>("parent_id")),
        author_id: blob_to_uuid(row.get::<Vec<u8>, _>("author_id").as_slice()),
        message: row.get("message"),
        message_format: row.get("message_format"),
        flags: row.get("flags"),
        private_reply_to: opt_blob_to_uuid(row.get::<Option<Vec<u8>>, _>("private_reply_to")),
        created_at: row.get("created_at"),
        modified_at: row.get("modified_at"),
    }
}

#[async_trait]
impl DataStore for SqliteDataStore {
    async fn forum(&self, id: Uuid) -> anyhow::Result<Option<ForumRecord>> {
        let row = sqlx::query("SELECT * FROM forums WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_forum))
    }

    async fn discussion(&self, id: Uuid) -> anyhow::Result<Option<DiscussionRecord>> {
        let row = sqlx::query("SELECT * FROM discussions WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_discussion))
    }

    async fn discussions_in_forum(
        &self,
        forum_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> anyhow::Result<Vec<DiscussionRecord>> {
        let rows = sqlx::query(
            "SELECT * FROM discussions WHERE forum_id = ?
             ORDER BY pinned DESC, id ASC LIMIT ? OFFSET ?",
        )
        .bind(uuid_to_blob(forum_id))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(map_discussion).collect())
    }

    async fn post(&self, id: Uuid) -> anyhow::Result<Option<PostRecord>> {
        let row = sqlx::query("SELECT * FROM posts WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(map_post))
    }

    async fn posts_in_discussions(
        &self,
        discussion_ids: &[Uuid],
    ) -> anyhow::Result<Vec<PostRecord>> {
        if discussion_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT * FROM posts WHERE discussion_id IN ({})
             ORDER BY created_at ASC, id ASC",
            placeholders(discussion_ids.len())
        );
        let mut query = sqlx::query(&sql);
        for id in discussion_ids {
            query = query.bind(uuid_to_blob(*id));
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.iter().map(map_post).collect())
    }

    async fn posts_by_author(
        &self,
        forum_id: Uuid,
        author_id: Uuid,
    ) -> anyhow::Result<Vec<PostRecord>> {
        let rows = sqlx::query(
            "SELECT p.* FROM posts p
             JOIN discussions d ON p.discussion_id = d.id
             WHERE d.forum_id = ? AND p.author_id = ?
             ORDER BY p.created_at ASC, p.id ASC",
        )
        .bind(uuid_to_blob(forum_id))
        .bind(uuid_to_blob(author_id))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(map_post).collect())
    }

    async fn authors(&self, ids: &[Uuid]) -> anyhow::Result<Vec<AuthorRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT * FROM authors WHERE id IN ({})",
            placeholders(ids.len())
        );
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(uuid_to_blob(*id));
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(|row| AuthorRecord {
                id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
                first_name: row.get("first_name"),
                last_name: row.get("last_name"),
                context_id: blob_to_uuid(row.get::<Vec<u8>, _>("context_id").as_slice()),
            })
            .collect())
    }

    async fn group_memberships(
        &self,
        course_id: Uuid,
        author_ids: &[Uuid],
    ) -> anyhow::Result<Vec<GroupMembershipRecord>> {
        if author_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT * FROM group_memberships WHERE course_id = ? AND author_id IN ({})",
            placeholders(author_ids.len())
        );
        let mut query = sqlx::query(&sql).bind(uuid_to_blob(course_id));
        for id in author_ids {
            query = query.bind(uuid_to_blob(*id));
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(|row| GroupMembershipRecord {
                author_id: blob_to_uuid(row.get::<Vec<u8>, _>("author_id").as_slice()),
                group_id: blob_to_uuid(row.get::<Vec<u8>, _>("group_id").as_slice()),
                group_name: row.get("group_name"),
            })
            .collect())
    }

    async fn tags_for_posts(&self, post_ids: &[Uuid]) -> anyhow::Result<Vec<TagRecord>> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT * FROM post_tags WHERE post_id IN ({}) ORDER BY name ASC",
            placeholders(post_ids.len())
        );
        let mut query = sqlx::query(&sql);
        for id in post_ids {
            query = query.bind(uuid_to_blob(*id));
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(|row| TagRecord {
                post_id: blob_to_uuid(row.get::<Vec<u8>, _>("post_id").as_slice()),
                name: row.get("name"),
            })
            .collect())
    }

    async fn ratings_for_posts(&self, post_ids: &[Uuid]) -> anyhow::Result<Vec<RatingRecord>> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT * FROM post_ratings WHERE post_id IN ({})",
            placeholders(post_ids.len())
        );
        let mut query = sqlx::query(&sql);
        for id in post_ids {
            query = query.bind(uuid_to_blob(*id));
        }
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows
            .iter()
            .map(|row| RatingRecord {
                post_id: blob_to_uuid(row.get::<Vec<u8>, _>("post_id").as_slice()),
                count: row.get("count"),
                aggregate: row.get("aggregate"),
            })
            .collect())
    }

    async fn update_post_flags(
        &self,
        post_id: Uuid,
        flags: Option<String>,
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE posts SET flags = ? WHERE id = ?")
            .bind(flags)
            .bind(uuid_to_blob(post_id))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    async fn store() -> SqliteDataStore {
        SqliteDataStore::new("sqlite::memory:").await.unwrap()
    }

    async fn seed_post(
        store: &SqliteDataStore,
        discussion_id: Uuid,
        flags: Option<&str>,
    ) -> Uuid {
        let id = Uuid::now_v7();
        sqlx::query(
            "INSERT INTO posts (id, discussion_id, parent_id, author_id, message,
             message_format, flags, private_reply_to, created_at, modified_at)
             VALUES (?, ?, NULL, ?, ?, 'html', ?, NULL, ?, ?)",
        )
        .bind(uuid_to_blob(id))
        .bind(uuid_to_blob(discussion_id))
        .bind(uuid_to_blob(Uuid::now_v7()))
        .bind("hello")
        .bind(flags)
        .bind(Utc::now())
        .bind(Utc::now())
        .execute(&store.pool)
        .await
        .unwrap();
        id
    }

    #[tokio::test]
    async fn fetches_posts_across_discussions() {
        let store = store().await;
        let d1 = Uuid::now_v7();
        let d2 = Uuid::now_v7();
        let unrelated = Uuid::now_v7();
        seed_post(&store, d1, Some("bookmark")).await;
        seed_post(&store, d2, None).await;
        seed_post(&store, unrelated, None).await;

        let posts = store.posts_in_discussions(&[d1, d2]).await.unwrap();
        assert_eq!(posts.len(), 2);
        assert!(posts.iter().all(|p| p.discussion_id != unrelated));
    }

    #[tokio::test]
    async fn flag_update_round_trips_including_null() {
        let store = store().await;
        let discussion_id = Uuid::now_v7();
        let post_id = seed_post(&store, discussion_id, None).await;

        store
            .update_post_flags(post_id, Some("bookmark,substantive".into()))
            .await
            .unwrap();
        let post = store.post(post_id).await.unwrap().unwrap();
        assert_eq!(post.flags.as_deref(), Some("bookmark,substantive"));

        store.update_post_flags(post_id, None).await.unwrap();
        let post = store.post(post_id).await.unwrap().unwrap();
        assert_eq!(post.flags, None);
    }

    #[tokio::test]
    async fn missing_forum_is_none() {
        let store = store().await;
        assert!(store.forum(Uuid::now_v7()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn null_parent_maps_to_none() {
        let store = store().await;
        let discussion_id = Uuid::now_v7();
        let post_id = seed_post(&store, discussion_id, None).await;

        let post = store.post(post_id).await.unwrap().unwrap();
        assert_eq!(post.parent_id, None);
    }
}
