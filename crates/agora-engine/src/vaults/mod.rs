//! # Vaults
//!
//! The only layer permitted to touch the backing stores. Vaults return
//! domain entities, never storage records, so callers never see the storage
//! schema. A requested id that does not exist is `NotFound`; a valid query
//! with nothing to return is an empty collection.

mod attachments;
mod authors;
mod discussions;
mod posts;

pub use attachments::AttachmentVault;
pub use authors::AuthorVault;
pub use discussions::DiscussionVault;
pub use posts::PostVault;
