//! Comment service.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use yatube_common::{AppResult, IdGenerator};
use yatube_db::{
    entities::{Timestamped, comment, user},
    repositories::{CommentRepository, PostRepository, UserRepository},
};

use super::post::AuthorSummary;
use crate::validation::clean_comment_text;

/// Input for commenting on a post.
#[derive(Debug, Default, Deserialize)]
pub struct CommentInput {
    #[serde(default)]
    pub text: String,
}

/// A comment with its author resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentView {
    pub id: String,
    pub post_id: String,
    pub text: String,
    pub created_at: DateTime<FixedOffset>,
    pub author: AuthorSummary,
}

impl Timestamped for CommentView {
    fn created_at(&self) -> DateTime<FixedOffset> {
        self.created_at
    }
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    post_repo: PostRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(
        comment_repo: CommentRepository,
        post_repo: PostRepository,
        user_repo: UserRepository,
    ) -> Self {
        Self {
            comment_repo,
            post_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Comment on a post.
    pub async fn add(
        &self,
        author: &user::Model,
        post_id: &str,
        input: CommentInput,
    ) -> AppResult<CommentView> {
        let post = self.post_repo.get_by_id(post_id).await?;
        let text = clean_comment_text(&input.text)?.to_string();

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post.id),
            author_id: Set(author.id.clone()),
            text: Set(text),
            created_at: Set(chrono::Utc::now().into()),
        };

        let comment = self.comment_repo.create(model).await?;
        tracing::info!(
            comment_id = %comment.id,
            post_id = %comment.post_id,
            excerpt = %comment.excerpt(),
            "Added comment"
        );

        Ok(CommentView {
            id: comment.id,
            post_id: comment.post_id,
            text: comment.text,
            created_at: comment.created_at,
            author: AuthorSummary::from(author),
        })
    }

    /// Comments under a post, newest first.
    pub async fn list_for_post(&self, post_id: &str) -> AppResult<Vec<CommentView>> {
        let comments = self.comment_repo.find_by_post(post_id).await?;

        let mut author_ids: Vec<String> = comments.iter().map(|c| c.author_id.clone()).collect();
        author_ids.sort();
        author_ids.dedup();
        let authors: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        Ok(comments
            .into_iter()
            .filter_map(|comment| {
                let author = authors.get(&comment.author_id)?;
                Some(CommentView {
                    author: AuthorSummary::from(author),
                    id: comment.id,
                    post_id: comment.post_id,
                    text: comment.text,
                    created_at: comment.created_at,
                })
            })
            .collect())
    }
}
