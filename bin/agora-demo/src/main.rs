//! # Agora Demo Binary
//!
//! Assembles the engine against the in-memory store, seeds a small forum,
//! and runs one action routed through the dispatch table.
//!
//! Usage: `agora-demo [discussion|forum|author|toggle <flag>|flags]`

use std::sync::Arc;

use chrono::Utc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use agora_core::{
    AuthorRecord, DiscussionRecord, FileArea, FileRecord, Forum, ForumRecord, Post, PostRecord,
    RatingRecord, TagRecord, ViewPolicy,
};
use agora_engine::{ActionTable, EngineFactory};
use agora_store_memory::MemoryStore;

/// Everything is decided by id equality here; a real host would consult its
/// permission system.
struct DemoPolicy {
    moderator: Uuid,
}

impl ViewPolicy for DemoPolicy {
    fn can_view_full_post(&self, viewer: Uuid, _post: &Post) -> bool {
        viewer == self.moderator
    }

    fn can_see_real_identity(&self, viewer: Uuid, _forum: &Forum) -> bool {
        viewer == self.moderator
    }
}

#[derive(Debug, Clone, Copy)]
enum Action {
    ExportDiscussion,
    ExportForum,
    ExportAuthor,
    ToggleFlag,
    ListFlags,
}

struct Seeded {
    forum: Uuid,
    discussion: Uuid,
    first_post: Uuid,
    author: Uuid,
    moderator: Uuid,
    viewer: Uuid,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let routes = ActionTable::new()
        .register("discussion", Action::ExportDiscussion)
        .register("forum", Action::ExportForum)
        .register("author", Action::ExportAuthor)
        .register("toggle", Action::ToggleFlag)
        .register("flags", Action::ListFlags);

    let name = std::env::args().nth(1).unwrap_or_else(|| "discussion".to_string());
    let action = routes.resolve(&name)?;

    let store = Arc::new(MemoryStore::new());
    let seeded = seed(&store);
    let factory = EngineFactory::new(
        store.clone(),
        store.clone(),
        Arc::new(DemoPolicy {
            moderator: seeded.moderator,
        }),
    )
    .with_pseudonym_salt("agora-demo");
    let builder = factory.export_builder();

    tracing::info!(action = name, "running");
    match action {
        Action::ExportDiscussion => {
            let bundle = builder.discussion(seeded.viewer, seeded.discussion).await?;
            println!("{}", serde_json::to_string_pretty(&bundle)?);
        }
        Action::ExportForum => {
            let bundles = builder.forum(seeded.viewer, seeded.forum, 10, 0).await?;
            println!("{}", serde_json::to_string_pretty(&bundles)?);
        }
        Action::ExportAuthor => {
            let posts = builder
                .posts_by_author(seeded.viewer, seeded.forum, seeded.author)
                .await?;
            println!("{}", serde_json::to_string_pretty(&posts)?);
        }
        Action::ToggleFlag => {
            let flag = std::env::args().nth(2).unwrap_or_else(|| "bookmark".to_string());
            let set = factory.flag_manager().toggle(seeded.first_post, &flag).await?;
            println!("flags on first post: {:?}", set.as_slice());
        }
        Action::ListFlags => {
            for flag in factory.registry().flags() {
                println!("{flag}");
            }
        }
    }
    Ok(())
}

/// A forum with one discussion: a root post with an attachment and a tag, a
/// reply, and a private reply only its participants can read in full.
fn seed(store: &MemoryStore) -> Seeded {
    let forum = Uuid::now_v7();
    let course = Uuid::now_v7();
    let context = Uuid::now_v7();
    let discussion = Uuid::now_v7();
    let author = Uuid::now_v7();
    let replier = Uuid::now_v7();
    let moderator = Uuid::now_v7();
    let viewer = Uuid::now_v7();

    store.insert_forum(ForumRecord {
        id: forum,
        course_id: course,
        name: "General discussion".into(),
        anonymous: false,
        context_id: context,
    });
    for (id, first, last) in [
        (author, "Ada", "Lovelace"),
        (replier, "Grace", "Hopper"),
        (moderator, "Tim", "Berners-Lee"),
    ] {
        store.insert_author(AuthorRecord {
            id,
            first_name: first.into(),
            last_name: last.into(),
            context_id: context,
        });
    }

    let first_post = Uuid::now_v7();
    store.insert_discussion(DiscussionRecord {
        id: discussion,
        forum_id: forum,
        name: "Welcome".into(),
        pinned: true,
        first_post_id: first_post,
    });

    let now = Utc::now();
    store.insert_post(PostRecord {
        id: first_post,
        discussion_id: discussion,
        parent_id: None,
        author_id: author,
        message: "Welcome to the course forum.".into(),
        message_format: "html".into(),
        flags: Some("bookmark".into()),
        private_reply_to: None,
        created_at: now,
        modified_at: now,
    });
    let reply = Uuid::now_v7();
    store.insert_post(PostRecord {
        id: reply,
        discussion_id: discussion,
        parent_id: Some(first_post),
        author_id: replier,
        message: "Glad to be here!".into(),
        message_format: "markdown".into(),
        flags: None,
        private_reply_to: None,
        created_at: now,
        modified_at: now,
    });
    store.insert_post(PostRecord {
        id: Uuid::now_v7(),
        discussion_id: discussion,
        parent_id: Some(reply),
        author_id: author,
        message: "A private note just for you.".into(),
        message_format: "html".into(),
        flags: None,
        private_reply_to: Some(replier),
        created_at: now,
        modified_at: now,
    });

    store.insert_file(
        context,
        "agora",
        FileRecord {
            item_id: first_post,
            area: FileArea::Attachment,
            filename: "syllabus.pdf".into(),
            size: 52_431,
            mimetype: "application/pdf".into(),
            url: "/files/syllabus.pdf".into(),
            is_directory: false,
        },
    );
    store.insert_tag(TagRecord {
        post_id: first_post,
        name: "welcome".into(),
    });
    store.insert_rating(RatingRecord {
        post_id: first_post,
        count: 3,
        aggregate: 4.5,
    });

    Seeded {
        forum,
        discussion,
        first_post,
        author,
        moderator,
        viewer,
    }
}
