use crate::cache::CacheStore;
use crate::client::{FeedClient, FetchOutcome, FetchResult};
use crate::transport::FeedTransport;
use chrono::{DateTime, Utc};
use core::time::Duration;
use futures::stream::{self, StreamExt};
use relay_primitives::documents::DetailsDocument;
use relay_primitives::{FeedDescriptor, FeedKind, FeedPayload, RunConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinatorError {
	#[error("required feed {feed} failed: {reason}")]
	RequiredFeedFailure { feed: FeedKind, reason: String },
}

/// A capability lost for this run because its optional feed could not be obtained.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradedCapability {
	pub feed: FeedKind,
	pub capability: String,
	pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedSummary {
	pub feed: FeedKind,
	pub outcome: FetchOutcome,
	pub stale: bool,
	pub entries: usize,
	pub fetched_at: Option<DateTime<Utc>>,
	pub failure: Option<String>,
}

/// Everything the reconciler needs, assembled only after every dispatched fetch settled.
#[derive(Clone, Debug, PartialEq)]
pub struct FetchResultBundle {
	pub details: DetailsDocument,
	/// Payloads of the optional feeds; degraded feeds carry their empty substitute.
	pub optional: BTreeMap<FeedKind, FeedPayload>,
	pub summaries: Vec<FeedSummary>,
	pub degraded: Vec<DegradedCapability>,
}

impl FetchResultBundle {
	/// Applies the required-vs-optional policy to a settled set of results.
	pub fn assemble(results: Vec<FetchResult>) -> Result<Self, CoordinatorError> {
		let mut by_feed: BTreeMap<FeedKind, FetchResult> =
			results.into_iter().map(|result| (result.feed, result)).collect();

		let details = match by_feed.remove(&FeedKind::Details) {
			Some(FetchResult { payload: Some(FeedPayload::Details(doc)), outcome, stale, fetched_at, .. }) => {
				(doc, outcome, stale, fetched_at)
			},
			Some(result) => {
				return Err(CoordinatorError::RequiredFeedFailure {
					feed: FeedKind::Details,
					reason: result.failure.unwrap_or_else(|| "payload missing".to_string()),
				})
			},
			None => {
				return Err(CoordinatorError::RequiredFeedFailure {
					feed: FeedKind::Details,
					reason: "feed is not configured".to_string(),
				})
			},
		};
		let (details, details_outcome, details_stale, details_fetched_at) = details;

		let mut summaries = vec![FeedSummary {
			feed: FeedKind::Details,
			outcome: details_outcome,
			stale: details_stale,
			entries: details.relays.len(),
			fetched_at: details_fetched_at,
			failure: None,
		}];
		let mut optional = BTreeMap::new();
		let mut degraded = Vec::new();

		for feed in FeedKind::ALL.into_iter().filter(|f| !f.is_required()) {
			let result = by_feed
				.remove(&feed)
				.unwrap_or_else(|| FetchResult::failed(feed, "feed is not configured"));

			let (payload, outcome) = match result.payload {
				Some(payload) if result.outcome != FetchOutcome::Failed => (payload, result.outcome),
				_ => {
					let reason = result.failure.clone().unwrap_or_else(|| "payload missing".to_string());
					log::warn!("⚠️ Optional feed {} degraded: {}", feed, reason);
					degraded.push(DegradedCapability {
						feed,
						capability: feed.capability().to_string(),
						reason,
					});
					match FeedPayload::empty(feed) {
						Some(empty) => (empty, FetchOutcome::Degraded),
						None => continue,
					}
				},
			};

			summaries.push(FeedSummary {
				feed,
				outcome,
				stale: result.stale,
				entries: payload.entry_count(),
				fetched_at: result.fetched_at,
				failure: result.failure,
			});
			optional.insert(feed, payload);
		}

		Ok(Self { details, optional, summaries, degraded })
	}

	pub fn payload(&self, feed: FeedKind) -> Option<&FeedPayload> {
		self.optional.get(&feed)
	}

	pub fn is_degraded(&self, feed: FeedKind) -> bool {
		self.degraded.iter().any(|d| d.feed == feed)
	}
}

/// Runs one feed client per configured feed on a bounded pool and waits for all of them.
pub struct FetchCoordinator {
	cache: Arc<CacheStore>,
	transport: Arc<dyn FeedTransport>,
	pool_size: usize,
	run_timeout: Duration,
	retry_backoff: Duration,
	allow_stale_fallback: bool,
}

impl FetchCoordinator {
	pub fn new(config: &RunConfig, cache: Arc<CacheStore>, transport: Arc<dyn FeedTransport>) -> Self {
		Self {
			cache,
			transport,
			pool_size: config.worker_pool_size.max(1),
			run_timeout: config.run_timeout(),
			retry_backoff: config.retry_backoff(),
			allow_stale_fallback: config.allow_stale_fallback,
		}
	}

	pub async fn run(&self, feeds: &[FeedDescriptor]) -> Result<FetchResultBundle, CoordinatorError> {
		log::info!("🔄 Fetching {} feeds with {} workers", feeds.len(), self.pool_size);

		let clients: Vec<FeedClient> = feeds
			.iter()
			.cloned()
			.map(|descriptor| {
				FeedClient::new(
					descriptor,
					self.cache.clone(),
					self.transport.clone(),
					self.retry_backoff,
					self.allow_stale_fallback,
				)
			})
			.collect();

		let settled = stream::iter(clients.iter())
			.map(|client| async move {
				let cached = self.cache.get(client.feed()).await;
				client.fetch(cached).await
			})
			.buffer_unordered(self.pool_size)
			.collect::<Vec<FetchResult>>();

		let results = match tokio::time::timeout(self.run_timeout, settled).await {
			Ok(results) => results,
			Err(_) => {
				log::error!("❌ Fetch run exceeded {:?}, aborting outstanding requests", self.run_timeout);
				return Err(CoordinatorError::RequiredFeedFailure {
					feed: FeedKind::Details,
					reason: format!("run timed out after {:?}", self.run_timeout),
				});
			},
		};

		let bundle = FetchResultBundle::assemble(results)?;
		log::info!(
			"✅ Fetch complete: {} feeds settled, {} degraded",
			bundle.summaries.len(),
			bundle.degraded.len()
		);
		Ok(bundle)
	}
}
