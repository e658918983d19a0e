use crate::cache::{CacheEntry, CacheStore, RevalidationToken};
use crate::transport::{FeedTransport, TransportError, TransportResponse};
use chrono::{DateTime, Utc};
use core::time::Duration;
use relay_primitives::{FeedDescriptor, FeedKind, FeedPayload};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOutcome {
	Fresh,
	Cached,
	Degraded,
	Failed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FetchResult {
	pub feed: FeedKind,
	pub outcome: FetchOutcome,
	pub payload: Option<FeedPayload>,
	/// Set when an expired cache entry was served because the refresh failed.
	pub stale: bool,
	pub failure: Option<String>,
	pub fetched_at: Option<DateTime<Utc>>,
}

impl FetchResult {
	fn fresh(feed: FeedKind, payload: FeedPayload, fetched_at: DateTime<Utc>) -> Self {
		Self {
			feed,
			outcome: FetchOutcome::Fresh,
			payload: Some(payload),
			stale: false,
			failure: None,
			fetched_at: Some(fetched_at),
		}
	}

	fn cached(feed: FeedKind, payload: FeedPayload, fetched_at: DateTime<Utc>) -> Self {
		Self {
			feed,
			outcome: FetchOutcome::Cached,
			payload: Some(payload),
			stale: false,
			failure: None,
			fetched_at: Some(fetched_at),
		}
	}

	pub fn failed(feed: FeedKind, reason: impl Into<String>) -> Self {
		Self {
			feed,
			outcome: FetchOutcome::Failed,
			payload: None,
			stale: false,
			failure: Some(reason.into()),
			fetched_at: None,
		}
	}
}

/// Performs the conditional fetch of exactly one feed.
pub struct FeedClient {
	descriptor: FeedDescriptor,
	cache: Arc<CacheStore>,
	transport: Arc<dyn FeedTransport>,
	retry_backoff: Duration,
	allow_stale_fallback: bool,
}

impl FeedClient {
	pub fn new(
		descriptor: FeedDescriptor,
		cache: Arc<CacheStore>,
		transport: Arc<dyn FeedTransport>,
		retry_backoff: Duration,
		allow_stale_fallback: bool,
	) -> Self {
		Self { descriptor, cache, transport, retry_backoff, allow_stale_fallback }
	}

	pub fn feed(&self) -> FeedKind {
		self.descriptor.kind
	}

	/// Resolves the feed against its cache entry, touching the network at most twice.
	pub async fn fetch(&self, cached: Option<CacheEntry>) -> FetchResult {
		let feed = self.feed();
		let now = Utc::now();

		let mut candidate: Option<(CacheEntry, FeedPayload)> = None;
		if let Some(entry) = cached {
			match FeedPayload::parse(feed, entry.payload.as_bytes()) {
				Ok(payload) if entry.is_fresh(self.descriptor.ttl, now) => {
					log::debug!("{} served from cache (age {:?})", feed, entry.age(now));
					return FetchResult::cached(feed, payload, entry.fetched_at);
				},
				Ok(payload) => candidate = Some((entry, payload)),
				Err(err) => {
					log::warn!("⚠️ Cached {} payload no longer matches its schema: {}", feed, err);
					self.cache.discard(feed).await;
				},
			}
		}

		let token = candidate.as_ref().map(|(entry, _)| &entry.token);
		let response = match self.request(token).await {
			Ok(response) => response,
			Err(err) => return self.fall_back(candidate, err.to_string()),
		};

		match response {
			TransportResponse::NotModified => match candidate {
				Some((entry, payload)) => {
					let fetched_at = match self.cache.touch(&entry).await {
						Ok(refreshed) => refreshed.fetched_at,
						Err(err) => {
							log::warn!("⚠️ Could not refresh {} cache timestamp: {}", feed, err);
							entry.fetched_at
						},
					};
					log::info!("✅ {} not modified since {}", feed, entry.fetched_at);
					FetchResult::cached(feed, payload, fetched_at)
				},
				None => FetchResult::failed(feed, "server reported not-modified without a cached copy"),
			},
			TransportResponse::Body { bytes, token } => match FeedPayload::parse(feed, &bytes) {
				Ok(payload) => {
					let fetched_at = self.store(bytes, token).await;
					log::info!("✅ Fetched {} ({} entries)", feed, payload.entry_count());
					FetchResult::fresh(feed, payload, fetched_at)
				},
				Err(err) => self.fall_back(candidate, err.to_string()),
			},
		}
	}

	/// Sends the request, retrying once after a fixed backoff when the error is transient.
	/// Both attempts and the backoff share a budget of twice the feed timeout.
	async fn request(
		&self,
		token: Option<&RevalidationToken>,
	) -> Result<TransportResponse, TransportError> {
		let started = Instant::now();
		let budget = self.descriptor.timeout.saturating_mul(2);
		let mut attempt = 0u32;

		loop {
			attempt += 1;
			let remaining = budget.saturating_sub(started.elapsed());
			let limit = self.descriptor.timeout.min(remaining);
			if limit.is_zero() {
				return Err(TransportError::Timeout(budget));
			}

			let result =
				match tokio::time::timeout(limit, self.transport.fetch(&self.descriptor.url, token, limit))
					.await
				{
					Ok(result) => result,
					Err(_) => Err(TransportError::Timeout(limit)),
				};

			match result {
				Err(err) if attempt == 1 && err.is_transient() => {
					let backoff = self.retry_backoff.min(budget.saturating_sub(started.elapsed()));
					log::warn!("⚠️ {} fetch failed ({}), retrying in {:?}", self.feed(), err, backoff);
					tokio::time::sleep(backoff).await;
				},
				other => return other,
			}
		}
	}

	async fn store(&self, bytes: Vec<u8>, token: RevalidationToken) -> DateTime<Utc> {
		let feed = self.feed();
		let text = match String::from_utf8(bytes) {
			Ok(text) => text,
			Err(err) => {
				log::warn!("⚠️ {} payload is not UTF-8, not caching it: {}", feed, err);
				return Utc::now();
			},
		};
		match self.cache.put(feed, text, token).await {
			Ok(entry) => entry.fetched_at,
			Err(err) => {
				log::warn!("⚠️ Could not cache {} payload: {}", feed, err);
				Utc::now()
			},
		}
	}

	fn fall_back(&self, candidate: Option<(CacheEntry, FeedPayload)>, reason: String) -> FetchResult {
		let feed = self.feed();
		match candidate {
			Some((entry, payload)) if self.allow_stale_fallback => {
				log::warn!(
					"⚠️ {} refresh failed ({}), serving cached copy from {}",
					feed,
					reason,
					entry.fetched_at
				);
				let mut result = FetchResult::cached(feed, payload, entry.fetched_at);
				result.stale = true;
				result.failure = Some(reason);
				result
			},
			_ => {
				log::error!("❌ {} fetch failed: {}", feed, reason);
				FetchResult::failed(feed, reason)
			},
		}
	}
}
