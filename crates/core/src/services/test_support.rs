//! Shared fixture for service tests: every service wired to a fresh
//! in-memory database and a scratch media directory.

#![allow(clippy::unwrap_used)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use yatube_common::{IdGenerator, LocalStorage, StorageBackend, generate_storage_key};
use yatube_db::entities::{group, user};
use yatube_db::repositories::{
    CommentRepository, FollowRepository, GroupRepository, PostRepository, UserRepository,
};
use yatube_db::test_utils::TestDatabase;

use super::{
    CommentService, CreateGroupInput, FeedService, FollowService, GroupService, ListingService,
    PostInput, PostService, ProvisionUserInput, UserService,
};
use crate::listing_cache::MemoryListingCache;

pub const INDEX_TTL: Duration = Duration::from_secs(1200);

pub struct Fixture {
    pub db: TestDatabase,
    pub media_dir: PathBuf,
    pub storage: Arc<LocalStorage>,
    pub users: UserService,
    pub groups: GroupService,
    pub posts: PostService,
    pub comments: CommentService,
    pub follows: FollowService,
    pub feed: FeedService,
    pub cache: MemoryListingCache,
    pub listing: ListingService,
}

impl Fixture {
    pub async fn new() -> Self {
        let db = TestDatabase::in_memory().await.unwrap();
        let conn = db.connection();

        let media_dir = std::env::temp_dir().join(format!("yatube-core-{}", IdGenerator::new().generate()));
        let storage = Arc::new(LocalStorage::new(media_dir.clone(), "/media".to_string()));

        let user_repo = UserRepository::new(conn.clone());
        let group_repo = GroupRepository::new(conn.clone());
        let post_repo = PostRepository::new(conn.clone());
        let comment_repo = CommentRepository::new(conn.clone());
        let follow_repo = FollowRepository::new(conn);

        let posts = PostService::new(
            post_repo.clone(),
            user_repo.clone(),
            group_repo.clone(),
            storage.clone(),
        );
        let cache = MemoryListingCache::new();

        Self {
            users: UserService::new(user_repo.clone()),
            groups: GroupService::new(group_repo),
            comments: CommentService::new(comment_repo, post_repo, user_repo.clone()),
            follows: FollowService::new(follow_repo, user_repo),
            feed: FeedService::new(posts.clone()),
            listing: ListingService::new(posts.clone(), Arc::new(cache.clone()), INDEX_TTL),
            posts,
            cache,
            storage,
            media_dir,
            db,
        }
    }

    pub async fn user(&self, username: &str) -> user::Model {
        self.users
            .provision(ProvisionUserInput {
                username: username.to_string(),
                name: None,
                is_admin: false,
            })
            .await
            .unwrap()
    }

    pub async fn group(&self, title: &str) -> group::Model {
        self.groups
            .create(CreateGroupInput {
                title: title.to_string(),
                slug: None,
                description: String::new(),
            })
            .await
            .unwrap()
    }

    /// Store a tiny GIF on behalf of `owner`, returning its key.
    pub async fn upload(&self, owner: &user::Model) -> String {
        let key = generate_storage_key(&owner.id, "small.gif");
        self.storage
            .upload(&key, b"GIF89a\x01\x00\x01\x00", "image/gif")
            .await
            .unwrap();
        key
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.media_dir);
    }
}

pub fn post_input(text: &str) -> PostInput {
    PostInput {
        text: text.to_string(),
        ..PostInput::default()
    }
}
