//! Database entities.

pub mod comment;
pub mod follow;
pub mod group;
pub mod post;
pub mod user;

pub use comment::Entity as Comment;
pub use follow::Entity as Follow;
pub use group::Entity as Group;
pub use post::Entity as Post;
pub use user::Entity as User;

use sea_orm::prelude::DateTimeWithTimeZone;

/// Number of characters shown by [`excerpt`].
pub const EXCERPT_LENGTH: usize = 15;

/// Records stamped with an immutable creation time.
pub trait Timestamped {
    /// When the record was created.
    fn created_at(&self) -> DateTimeWithTimeZone;
}

/// The first [`EXCERPT_LENGTH`] characters of `text`.
#[must_use]
pub fn excerpt(text: &str) -> &str {
    match text.char_indices().nth(EXCERPT_LENGTH) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
