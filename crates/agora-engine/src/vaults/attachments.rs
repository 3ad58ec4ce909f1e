//! Attachment lookups, batched per area.
//!
//! One bulk file-store query serves an entire batch of posts; there is never
//! a query per post.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use agora_core::{FileArea, FileRecord, FileStore, Result, StoredFile};

/// Component namespace the engine's files live under in the file store.
const COMPONENT: &str = "agora";

pub struct AttachmentVault {
    files: Arc<dyn FileStore>,
}

impl AttachmentVault {
    pub(crate) fn new(files: Arc<dyn FileStore>) -> Self {
        Self { files }
    }

    /// Files uploaded as attachments proper.
    pub async fn attachments_for_posts(
        &self,
        context_id: Uuid,
        post_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<StoredFile>>> {
        self.files_for_posts(context_id, post_ids, FileArea::Attachment)
            .await
    }

    /// Files embedded in the message body.
    pub async fn inline_files_for_posts(
        &self,
        context_id: Uuid,
        post_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<StoredFile>>> {
        self.files_for_posts(context_id, post_ids, FileArea::Post)
            .await
    }

    /// One bulk query for `area`, regrouped per post. The result carries an
    /// entry for every requested id, empty when a post owns no files, and
    /// each list is sorted by filename with directory entries excluded.
    pub async fn files_for_posts(
        &self,
        context_id: Uuid,
        post_ids: &[Uuid],
        area: FileArea,
    ) -> Result<HashMap<Uuid, Vec<StoredFile>>> {
        let mut map: HashMap<Uuid, Vec<StoredFile>> =
            post_ids.iter().map(|id| (*id, Vec::new())).collect();
        if post_ids.is_empty() {
            return Ok(map);
        }

        let records = self
            .files
            .area_files(context_id, COMPONENT, area, post_ids, false)
            .await?;
        for record in records {
            if record.is_directory {
                continue;
            }
            if let Some(bucket) = map.get_mut(&record.item_id) {
                bucket.push(map_file(record));
            }
        }
        for bucket in map.values_mut() {
            bucket.sort_by(|a, b| a.filename.cmp(&b.filename));
        }
        Ok(map)
    }
}

fn map_file(record: FileRecord) -> StoredFile {
    StoredFile {
        item_id: record.item_id,
        area: record.area,
        filename: record.filename,
        size: record.size.max(0) as u64,
        mimetype: record.mimetype,
        url: record.url,
    }
}
