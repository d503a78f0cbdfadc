//! Domain entities - the core business objects.

mod category;
mod identity;
mod post;

pub use category::{CategoryList, DEFAULT_CATEGORIES};
pub use identity::{ANONYMOUS_AUTHOR, Identity};
pub use post::{DEFAULT_READ_TIME, PLACEHOLDER_IMAGE, Post, PostDraft, PostId, PostRecord};
