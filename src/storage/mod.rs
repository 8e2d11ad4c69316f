//! Persistence: the per-feed item cache and the subscription list.
//!
//! Both are plain files written with [`atomic_write`](crate::util::atomic_write),
//! so an interrupted save never leaves a half-written file behind.

mod cache;
mod subscriptions;

pub use cache::{cache_key, CacheError, CacheStore, CachedFeed, CachedItem};
pub use subscriptions::{Subscription, SubscriptionError, SubscriptionList};
