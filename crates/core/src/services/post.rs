//! Post service.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;
use yatube_common::{AppError, AppResult, IdGenerator, StorageBackend, owns_storage_key};
use yatube_db::{
    entities::{Timestamped, group, post, user},
    repositories::{GroupRepository, PostFilter, PostRepository, UserRepository},
};

use crate::forms::{self, Choice, FormDescriptor, PostFormInitial};
use crate::pagination::{PAGE_SIZE, Page, PageMeta, PageRequest};
use crate::validation::clean_post_text;

/// Input for creating or editing a post.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PostInput {
    #[serde(default)]
    pub text: String,

    /// Group ID; absent or empty files the post under no group.
    #[serde(default)]
    #[validate(length(max = 32))]
    pub group: Option<String>,

    /// Storage key returned by the media upload.
    #[serde(default)]
    #[validate(length(max = 512))]
    pub image: Option<String>,

    /// Drop the current image when editing.
    #[serde(default)]
    pub clear_image: bool,
}

/// Author as shown next to posts and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub id: String,
    pub username: String,
    pub name: Option<String>,
}

impl From<&user::Model> for AuthorSummary {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            name: user.name.clone(),
        }
    }
}

/// Group as shown next to posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub id: String,
    pub title: String,
    pub slug: String,
}

impl From<&group::Model> for GroupSummary {
    fn from(group: &group::Model) -> Self {
        Self {
            id: group.id.clone(),
            title: group.title.clone(),
            slug: group.slug.clone(),
        }
    }
}

/// A post with its author and group resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostView {
    pub id: String,
    pub text: String,
    pub created_at: DateTime<FixedOffset>,
    pub author: AuthorSummary,
    pub group: Option<GroupSummary>,
    /// Storage key of the attached image.
    pub image: Option<String>,
    pub image_url: Option<String>,
}

impl Timestamped for PostView {
    fn created_at(&self) -> DateTime<FixedOffset> {
        self.created_at
    }
}

/// Result of an edit attempt, which only the author may make.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome<T> {
    /// The editor wrote the post.
    Author(T),
    /// Someone else wrote the post; nothing was changed.
    NotAuthor,
}

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    user_repo: UserRepository,
    group_repo: GroupRepository,
    storage: Arc<dyn StorageBackend>,
    id_gen: IdGenerator,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub fn new(
        post_repo: PostRepository,
        user_repo: UserRepository,
        group_repo: GroupRepository,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        Self {
            post_repo,
            user_repo,
            group_repo,
            storage,
            id_gen: IdGenerator::new(),
        }
    }

    /// Get a single post.
    pub async fn get(&self, id: &str) -> AppResult<PostView> {
        let post = self.post_repo.get_by_id(id).await?;
        self.pack(vec![post])
            .await?
            .pop()
            .ok_or_else(|| AppError::PostNotFound(id.to_string()))
    }

    /// One page of a post listing, newest first.
    pub async fn list(&self, filter: &PostFilter, request: PageRequest) -> AppResult<Page<PostView>> {
        let count = self.post_repo.count(filter).await?;
        let meta = PageMeta::resolve(request, count, PAGE_SIZE);
        let posts = self
            .post_repo
            .find_slice(filter, meta.offset(PAGE_SIZE), PAGE_SIZE)
            .await?;

        Ok(Page::new(self.pack(posts).await?, meta))
    }

    /// Publish a post.
    pub async fn create(&self, author: &user::Model, input: PostInput) -> AppResult<PostView> {
        input.validate()?;
        let text = clean_post_text(&input.text)?.to_string();
        let group_id = self.resolve_group(input.group.as_deref()).await?;
        let image = self.check_image(author, input.image.as_deref()).await?;

        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            text: Set(text),
            created_at: Set(chrono::Utc::now().into()),
            author_id: Set(author.id.clone()),
            group_id: Set(group_id),
            image: Set(image),
        };

        let post = self.post_repo.create(model).await?;
        tracing::info!(
            post_id = %post.id,
            author = %author.username,
            excerpt = %post.excerpt(),
            "Created post"
        );

        self.get(&post.id).await
    }

    /// Change a post's text, group and image. Its timestamp never changes.
    pub async fn edit(
        &self,
        editor: &user::Model,
        post_id: &str,
        input: PostInput,
    ) -> AppResult<EditOutcome<PostView>> {
        let post = self.post_repo.get_by_id(post_id).await?;
        if post.author_id != editor.id {
            tracing::debug!(post_id = %post_id, editor = %editor.username, "Edit by non-author");
            return Ok(EditOutcome::NotAuthor);
        }

        input.validate()?;
        let text = clean_post_text(&input.text)?.to_string();
        let group_id = self.resolve_group(input.group.as_deref()).await?;
        let image = self.check_image(editor, input.image.as_deref()).await?;

        let mut active: post::ActiveModel = post.into();
        active.text = Set(text);
        active.group_id = Set(group_id);
        if input.clear_image {
            active.image = Set(None);
        } else if image.is_some() {
            active.image = Set(image);
        }

        let post = self.post_repo.update(active).await?;
        tracing::info!(post_id = %post.id, excerpt = %post.excerpt(), "Edited post");

        Ok(EditOutcome::Author(self.get(&post.id).await?))
    }

    /// The empty post form.
    pub async fn create_form(&self, action: String) -> AppResult<FormDescriptor> {
        Ok(forms::post_form(
            action,
            self.group_choices().await?,
            PostFormInitial::default(),
        ))
    }

    /// The post form filled with a post's current values.
    pub async fn edit_form(
        &self,
        editor: &user::Model,
        post_id: &str,
        action: String,
    ) -> AppResult<EditOutcome<(PostView, FormDescriptor)>> {
        let post = self.get(post_id).await?;
        if post.author.id != editor.id {
            return Ok(EditOutcome::NotAuthor);
        }

        let initial = PostFormInitial {
            text: Some(post.text.clone()),
            group_id: post.group.as_ref().map(|g| g.id.clone()),
            image: post.image.clone(),
        };
        let form = forms::post_form(action, self.group_choices().await?, initial);

        Ok(EditOutcome::Author((post, form)))
    }

    async fn group_choices(&self) -> AppResult<Vec<Choice>> {
        Ok(self
            .group_repo
            .find_all()
            .await?
            .into_iter()
            .map(|g| Choice {
                value: g.id,
                label: g.title,
            })
            .collect())
    }

    async fn resolve_group(&self, group_id: Option<&str>) -> AppResult<Option<String>> {
        let Some(group_id) = group_id.map(str::trim).filter(|id| !id.is_empty()) else {
            return Ok(None);
        };

        match self.group_repo.find_by_id(group_id).await? {
            Some(group) => Ok(Some(group.id)),
            None => Err(AppError::InvalidField {
                field: "group",
                message: "Select a valid choice. That choice is not one of the available choices."
                    .to_string(),
            }),
        }
    }

    async fn check_image(&self, author: &user::Model, key: Option<&str>) -> AppResult<Option<String>> {
        let Some(key) = key.filter(|k| !k.is_empty()) else {
            return Ok(None);
        };

        if !owns_storage_key(&author.id, key) || !self.storage.exists(key).await? {
            return Err(AppError::InvalidField {
                field: "image",
                message: "Upload a valid image.".to_string(),
            });
        }

        Ok(Some(key.to_string()))
    }

    /// Resolve authors and groups for a batch of posts, keeping their order.
    async fn pack(&self, posts: Vec<post::Model>) -> AppResult<Vec<PostView>> {
        let mut author_ids: Vec<String> = posts.iter().map(|p| p.author_id.clone()).collect();
        author_ids.sort();
        author_ids.dedup();
        let mut group_ids: Vec<String> = posts.iter().filter_map(|p| p.group_id.clone()).collect();
        group_ids.sort();
        group_ids.dedup();

        let authors: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();
        let groups: HashMap<String, group::Model> = self
            .group_repo
            .find_by_ids(&group_ids)
            .await?
            .into_iter()
            .map(|g| (g.id.clone(), g))
            .collect();

        Ok(posts
            .into_iter()
            .filter_map(|post| {
                let Some(author) = authors.get(&post.author_id) else {
                    tracing::warn!(post_id = %post.id, "Post author is missing");
                    return None;
                };
                let group = post
                    .group_id
                    .as_ref()
                    .and_then(|id| groups.get(id))
                    .map(GroupSummary::from);
                let image_url = post.image.as_deref().map(|key| self.storage.public_url(key));

                Some(PostView {
                    id: post.id,
                    text: post.text,
                    created_at: post.created_at,
                    author: AuthorSummary::from(author),
                    group,
                    image: post.image,
                    image_url,
                })
            })
            .collect())
    }
}
