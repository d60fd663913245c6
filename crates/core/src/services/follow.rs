//! Follow/unfollow state machine.
//!
//! Each (user, author) pair is either following or not. Following is
//! idempotent and silently refused for oneself; unfollowing an author one does
//! not follow does nothing.

use sea_orm::Set;
use yatube_common::{AppError, AppResult, IdGenerator};
use yatube_db::{
    entities::{follow, user},
    repositories::{FollowRepository, UserRepository},
};

/// Relationship between a viewer and an author after a follow operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowStatus {
    pub author: user::Model,
    pub following: bool,
}

/// Follow service for business logic.
#[derive(Clone)]
pub struct FollowService {
    follow_repo: FollowRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl FollowService {
    /// Create a new follow service.
    #[must_use]
    pub const fn new(follow_repo: FollowRepository, user_repo: UserRepository) -> Self {
        Self {
            follow_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Whether the viewer, if any, follows the author.
    pub async fn is_following(
        &self,
        viewer: Option<&user::Model>,
        author: &user::Model,
    ) -> AppResult<bool> {
        match viewer {
            Some(viewer) => self.follow_repo.is_following(&viewer.id, &author.id).await,
            None => Ok(false),
        }
    }

    /// Follow an author by username.
    pub async fn follow(&self, user: &user::Model, username: &str) -> AppResult<FollowStatus> {
        let author = self.user_repo.get_by_username(username).await?;

        if user.id == author.id {
            return Ok(FollowStatus {
                author,
                following: false,
            });
        }

        if self
            .follow_repo
            .find_by_pair(&user.id, &author.id)
            .await?
            .is_none()
        {
            let model = follow::ActiveModel {
                id: Set(self.id_gen.generate()),
                user_id: Set(user.id.clone()),
                author_id: Set(author.id.clone()),
                created_at: Set(chrono::Utc::now().into()),
            };

            match self.follow_repo.create(model).await {
                Ok(_) => {
                    tracing::info!(user = %user.username, author = %author.username, "Followed author");
                }
                // A concurrent request created the same edge.
                Err(AppError::Conflict(_)) => {
                    tracing::debug!(user = %user.username, author = %author.username, "Already following");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(FollowStatus {
            author,
            following: true,
        })
    }

    /// Unfollow an author by username.
    pub async fn unfollow(&self, user: &user::Model, username: &str) -> AppResult<FollowStatus> {
        let author = self.user_repo.get_by_username(username).await?;

        if user.id != author.id && self.follow_repo.delete_by_pair(&user.id, &author.id).await? {
            tracing::info!(user = %user.username, author = %author.username, "Unfollowed author");
        }

        Ok(FollowStatus {
            author,
            following: false,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::test_support::Fixture;
    use yatube_db::repositories::FollowRepository;

    fn edges(fx: &Fixture) -> FollowRepository {
        FollowRepository::new(fx.db.connection())
    }

    #[tokio::test]
    async fn test_follow_is_idempotent() {
        let fx = Fixture::new().await;
        let reader = fx.user("reader").await;
        let leo = fx.user("leo").await;

        assert!(fx.follows.follow(&reader, "leo").await.unwrap().following);
        assert!(fx.follows.follow(&reader, "leo").await.unwrap().following);

        assert_eq!(edges(&fx).count_following(&reader.id).await.unwrap(), 1);
        assert!(fx.follows.is_following(Some(&reader), &leo).await.unwrap());
    }

    #[tokio::test]
    async fn test_self_follow_is_noop() {
        let fx = Fixture::new().await;
        let leo = fx.user("leo").await;

        let status = fx.follows.follow(&leo, "leo").await.unwrap();

        assert!(!status.following);
        assert_eq!(edges(&fx).count_following(&leo.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unfollow() {
        let fx = Fixture::new().await;
        let reader = fx.user("reader").await;
        let leo = fx.user("leo").await;
        fx.follows.follow(&reader, "leo").await.unwrap();

        let status = fx.follows.unfollow(&reader, "leo").await.unwrap();

        assert!(!status.following);
        assert!(!fx.follows.is_following(Some(&reader), &leo).await.unwrap());
    }

    #[tokio::test]
    async fn test_unfollow_without_edge_is_noop() {
        let fx = Fixture::new().await;
        let reader = fx.user("reader").await;
        fx.user("leo").await;

        let status = fx.follows.unfollow(&reader, "leo").await.unwrap();

        assert!(!status.following);
        assert_eq!(edges(&fx).count_following(&reader.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_follow_unknown_author() {
        let fx = Fixture::new().await;
        let reader = fx.user("reader").await;

        assert!(matches!(
            fx.follows.follow(&reader, "ghost").await,
            Err(AppError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_anonymous_viewer_follows_nobody() {
        let fx = Fixture::new().await;
        let leo = fx.user("leo").await;

        assert!(!fx.follows.is_following(None, &leo).await.unwrap());
    }
}
