//! Feed of posts by followed authors.

use yatube_common::AppResult;
use yatube_db::{entities::user, repositories::PostFilter};

use super::post::{PostService, PostView};
use crate::pagination::{Page, PageRequest};

/// Builds a viewer's feed from their current follow edges.
#[derive(Clone)]
pub struct FeedService {
    posts: PostService,
}

impl FeedService {
    /// Create a new feed service.
    #[must_use]
    pub const fn new(posts: PostService) -> Self {
        Self { posts }
    }

    /// One page of posts by authors the viewer follows, newest first.
    pub async fn feed(&self, viewer: &user::Model, request: PageRequest) -> AppResult<Page<PostView>> {
        self.posts
            .list(&PostFilter::FollowedBy(viewer.id.clone()), request)
            .await
    }
}
