//! Feed acquisition: the on-disk cache, the per-feed conditional client and the coordinator that
//! runs every feed on a bounded pool and decides which failures are fatal.

pub mod cache;
pub mod client;
pub mod coordinator;
pub mod transport;

#[cfg(any(test, feature = "mock"))]
pub mod mock;


pub use cache::{CacheEntry, CacheError, CacheStore, RevalidationToken};
pub use client::{FeedClient, FetchOutcome, FetchResult};
pub use coordinator::{
	CoordinatorError, DegradedCapability, FeedSummary, FetchCoordinator, FetchResultBundle,
};
pub use transport::{FeedTransport, HttpTransport, TransportError, TransportResponse};
