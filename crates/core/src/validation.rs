//! Text acceptance rules for posts and comments.

use std::collections::HashSet;

use yatube_common::{AppError, AppResult};

/// Fewest distinct characters a post may consist of.
pub const MIN_DISTINCT_CHARS: usize = 3;

/// Why post text was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PostTextError {
    /// Empty or whitespace only.
    #[error("Fill the post with text.")]
    Blank,

    /// Too few distinct characters.
    #[error("Write something more meaningful.")]
    TooRepetitive,
}

impl From<PostTextError> for AppError {
    fn from(err: PostTextError) -> Self {
        Self::InvalidField {
            field: "text",
            message: err.to_string(),
        }
    }
}

/// Accept or reject candidate post text.
///
/// Blank text fails first. Otherwise the text must hold at least
/// [`MIN_DISTINCT_CHARS`] distinct characters. Accepted text is returned as is.
pub fn clean_post_text(text: &str) -> Result<&str, PostTextError> {
    if text.trim().is_empty() {
        return Err(PostTextError::Blank);
    }

    let distinct: HashSet<char> = text.chars().collect();
    if distinct.len() < MIN_DISTINCT_CHARS {
        return Err(PostTextError::TooRepetitive);
    }

    Ok(text)
}

/// Comment text is required and may not be blank.
pub fn clean_comment_text(text: &str) -> AppResult<&str> {
    if text.trim().is_empty() {
        return Err(AppError::InvalidField {
            field: "text",
            message: "This field is required.".to_string(),
        });
    }
    Ok(text)
}
