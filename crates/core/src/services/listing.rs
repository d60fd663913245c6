//! Home listing, served through the listing cache.
//!
//! Pages are cached by requested page number for a fixed TTL. Creating or
//! editing posts leaves cached pages alone, so new posts show up only after
//! the entry expires or the cache is flushed.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use yatube_common::AppResult;
use yatube_db::repositories::PostFilter;

use super::post::{PostService, PostView};
use crate::listing_cache::ListingCache;
use crate::pagination::{Page, PageRequest};

/// Serves the global post listing.
#[derive(Clone)]
pub struct ListingService {
    posts: PostService,
    cache: Arc<dyn ListingCache>,
    ttl: Duration,
}

impl ListingService {
    /// Create a new listing service.
    #[must_use]
    pub fn new(posts: PostService, cache: Arc<dyn ListingCache>, ttl: Duration) -> Self {
        Self { posts, cache, ttl }
    }

    fn cache_key(request: PageRequest) -> String {
        format!("page:{}", request.number())
    }

    /// One page of the home listing.
    ///
    /// An unreachable cache degrades to an uncached read.
    pub async fn index(&self, request: PageRequest) -> AppResult<Page<PostView>> {
        let key = Self::cache_key(request);

        match self.cache.get(&key).await {
            Ok(Some(cached)) => match serde_json::from_str::<Page<PostView>>(&cached) {
                Ok(page) => {
                    debug!(key = %key, "Listing cache hit");
                    return Ok(page);
                }
                Err(e) => warn!(key = %key, error = %e, "Discarding unreadable cached listing"),
            },
            Ok(None) => debug!(key = %key, "Listing cache miss"),
            Err(e) => warn!(key = %key, error = %e, "Listing cache unavailable"),
        }

        let page = self.posts.list(&PostFilter::All, request).await?;

        match serde_json::to_string(&page) {
            Ok(json) => {
                if let Err(e) = self.cache.set(&key, json, self.ttl).await {
                    warn!(key = %key, error = %e, "Failed to cache listing");
                }
            }
            Err(e) => warn!(key = %key, error = %e, "Failed to serialize listing"),
        }

        Ok(page)
    }

    /// Drop every cached page.
    pub async fn flush(&self) -> AppResult<()> {
        self.cache.clear().await?;
        info!("Flushed home listing cache");
        Ok(())
    }
}
