//! Business logic services.

pub mod comment;
pub mod feed;
pub mod follow;
pub mod group;
pub mod listing;
pub mod post;
pub mod user;

pub use comment::{CommentInput, CommentService, CommentView};
pub use feed::FeedService;
pub use follow::{FollowService, FollowStatus};
pub use group::{CreateGroupInput, GroupService};
pub use listing::ListingService;
pub use post::{AuthorSummary, EditOutcome, GroupSummary, PostInput, PostService, PostView};
pub use user::{ProvisionUserInput, UserService};

#[cfg(test)]
pub(crate) mod test_support;
