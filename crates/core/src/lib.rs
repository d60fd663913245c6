//! Core business logic for yatube-rs.

pub mod forms;
pub mod listing_cache;
pub mod pagination;
pub mod services;
pub mod validation;

pub use forms::{FormDescriptor, comment_form};
pub use listing_cache::{ListingCache, MemoryListingCache, RedisListingCache};
pub use pagination::{PAGE_SIZE, Page, PageMeta, PageRequest};
pub use services::*;
pub use validation::{PostTextError, clean_comment_text, clean_post_text};
