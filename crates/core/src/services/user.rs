//! User service.

use std::sync::LazyLock;

use regex::Regex;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;
use yatube_common::{AppError, AppResult, IdGenerator};
use yatube_db::{entities::user, repositories::UserRepository};

static USERNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[\w.@+-]+$").expect("valid username regex")
});

/// Input for provisioning an author.
#[derive(Debug, Deserialize, Validate)]
pub struct ProvisionUserInput {
    #[validate(length(min = 1, max = 150), regex(path = *USERNAME_RE))]
    pub username: String,

    #[validate(length(max = 256))]
    pub name: Option<String>,

    #[serde(default)]
    pub is_admin: bool,
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Resolve the viewer behind an access token.
    pub async fn authenticate(&self, token: &str) -> AppResult<Option<user::Model>> {
        self.user_repo.find_by_token(token).await
    }

    /// Look up an author by username.
    pub async fn get_by_username(&self, username: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_username(username).await
    }

    /// Create an author with a fresh access token.
    pub async fn provision(&self, input: ProvisionUserInput) -> AppResult<user::Model> {
        input.validate()?;

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(input.username),
            name: Set(input.name),
            token: Set(Some(self.id_gen.generate_token())),
            is_admin: Set(input.is_admin),
            created_at: Set(chrono::Utc::now().into()),
        };

        let user = self.user_repo.create(model).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "Provisioned user");
        Ok(user)
    }

    /// Make sure the configured administrator exists with the given token.
    pub async fn ensure_admin(&self, username: &str, token: &str) -> AppResult<user::Model> {
        if let Some(existing) = self.user_repo.find_by_username(username).await? {
            if existing.is_admin && existing.token.as_deref() == Some(token) {
                return Ok(existing);
            }

            let mut active: user::ActiveModel = existing.into();
            active.is_admin = Set(true);
            active.token = Set(Some(token.to_string()));
            let admin = self.user_repo.update(active).await?;
            tracing::info!(username = %admin.username, "Updated bootstrap administrator");
            return Ok(admin);
        }

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(username.to_string()),
            name: Set(None),
            token: Set(Some(token.to_string())),
            is_admin: Set(true),
            created_at: Set(chrono::Utc::now().into()),
        };
        let admin = self.user_repo.create(model).await?;
        tracing::info!(username = %admin.username, "Created bootstrap administrator");
        Ok(admin)
    }

    /// Delete an author and everything they own.
    pub async fn delete(&self, username: &str) -> AppResult<()> {
        let user = self.user_repo.get_by_username(username).await?;
        if !self.user_repo.delete(&user.id).await? {
            return Err(AppError::UserNotFound(username.to_string()));
        }
        tracing::info!(user_id = %user.id, username = %username, "Deleted user");
        Ok(())
    }
}
