//! Batched author and group-membership lookups.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use agora_core::{Author, AuthorRecord, DataStore, Group, Result};

pub struct AuthorVault {
    store: Arc<dyn DataStore>,
}

impl AuthorVault {
    pub(crate) fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Authors keyed by id. Ids with no matching author are simply absent;
    /// exporters degrade those to a placeholder.
    pub async fn by_ids(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Author>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let records = self.store.authors(ids).await?;
        Ok(records.into_iter().map(|r| (r.id, map_author(r))).collect())
    }

    /// Group memberships within `course_id`, keyed by author id. Every
    /// requested author has an entry, empty when ungrouped.
    pub async fn groups(
        &self,
        course_id: Uuid,
        author_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Group>>> {
        let mut map: HashMap<Uuid, Vec<Group>> =
            author_ids.iter().map(|id| (*id, Vec::new())).collect();
        if author_ids.is_empty() {
            return Ok(map);
        }
        for record in self.store.group_memberships(course_id, author_ids).await? {
            if let Some(bucket) = map.get_mut(&record.author_id) {
                bucket.push(Group {
                    id: record.group_id,
                    name: record.group_name,
                });
            }
        }
        Ok(map)
    }
}

fn map_author(record: AuthorRecord) -> Author {
    Author {
        id: record.id,
        first_name: record.first_name,
        last_name: record.last_name,
        context_id: record.context_id,
    }
}
