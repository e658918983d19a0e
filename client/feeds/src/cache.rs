//! TTL cache of raw feed payloads.
//!
//! One JSON file per feed identity. An entry is never deleted because it expired: expired entries
//! are still handed back so the feed client can revalidate them with a conditional request. Only
//! entries that cannot be decoded, or whose payload no longer matches the stored checksum, are
//! discarded.

use chrono::{DateTime, Utc};
use core::time::Duration;
use relay_primitives::FeedKind;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
	#[error("cache i/o on {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("failed to encode cache entry: {0}")]
	Encode(#[from] serde_json::Error),
}

/// Validators replayed on the next conditional request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevalidationToken {
	pub etag: Option<String>,
	pub last_modified: Option<String>,
}

impl RevalidationToken {
	pub fn is_empty(&self) -> bool {
		self.etag.is_none() && self.last_modified.is_none()
	}
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
	pub feed: FeedKind,
	pub payload: String,
	pub token: RevalidationToken,
	pub fetched_at: DateTime<Utc>,
	pub checksum: String,
}

impl CacheEntry {
	pub fn new(feed: FeedKind, payload: String, token: RevalidationToken, fetched_at: DateTime<Utc>) -> Self {
		let checksum = payload_checksum(payload.as_bytes());
		Self { feed, payload, token, fetched_at, checksum }
	}

	pub fn age(&self, now: DateTime<Utc>) -> Duration {
		(now - self.fetched_at).to_std().unwrap_or(Duration::ZERO)
	}

	/// An entry stamped in the future is never fresh.
	pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
		match (now - self.fetched_at).to_std() {
			Ok(age) => age < ttl,
			Err(_) => false,
		}
	}

	fn is_intact(&self) -> bool {
		self.checksum == payload_checksum(self.payload.as_bytes())
	}
}

pub fn payload_checksum(payload: &[u8]) -> String {
	hex::encode(Sha256::digest(payload))
}

/// Directory-backed store. Each feed identity is written by exactly one feed client per run, so
/// concurrent clients never touch the same file and no locking is needed.
#[derive(Clone, Debug)]
pub struct CacheStore {
	dir: PathBuf,
}

impl CacheStore {
	pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
		let dir = dir.into();
		tokio::fs::create_dir_all(&dir)
			.await
			.map_err(|source| CacheError::Io { path: dir.clone(), source })?;
		Ok(Self { dir })
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	fn path_for(&self, feed: FeedKind) -> PathBuf {
		self.dir.join(format!("{}.json", feed.as_str()))
	}

	/// Returns the stored entry, fresh or expired. Unreadable entries count as a miss.
	pub async fn get(&self, feed: FeedKind) -> Option<CacheEntry> {
		let path = self.path_for(feed);
		let raw = match tokio::fs::read(&path).await {
			Ok(raw) => raw,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
			Err(err) => {
				log::warn!("⚠️ Could not read cache entry {}: {}", path.display(), err);
				return None;
			},
		};

		match serde_json::from_slice::<CacheEntry>(&raw) {
			Ok(entry) if entry.feed == feed && entry.is_intact() => Some(entry),
			Ok(_) => {
				log::warn!("⚠️ Cache entry for {} failed its integrity check, discarding", feed);
				self.discard(feed).await;
				None
			},
			Err(err) => {
				log::warn!("⚠️ Cache entry for {} is corrupt ({}), discarding", feed, err);
				self.discard(feed).await;
				None
			},
		}
	}

	pub async fn put(
		&self,
		feed: FeedKind,
		payload: String,
		token: RevalidationToken,
	) -> Result<CacheEntry, CacheError> {
		let entry = CacheEntry::new(feed, payload, token, Utc::now());
		self.write(&entry).await?;
		Ok(entry)
	}

	/// Re-stamps an entry after the server confirmed it is still current.
	pub async fn touch(&self, entry: &CacheEntry) -> Result<CacheEntry, CacheError> {
		let mut refreshed = entry.clone();
		refreshed.fetched_at = Utc::now();
		self.write(&refreshed).await?;
		Ok(refreshed)
	}

	pub async fn discard(&self, feed: FeedKind) {
		let path = self.path_for(feed);
		if let Err(err) = tokio::fs::remove_file(&path).await {
			if err.kind() != std::io::ErrorKind::NotFound {
				log::warn!("⚠️ Could not remove cache entry {}: {}", path.display(), err);
			}
		}
	}

	async fn write(&self, entry: &CacheEntry) -> Result<(), CacheError> {
		let path = self.path_for(entry.feed);
		let staging = path.with_extension("json.tmp");
		let encoded = serde_json::to_vec(entry)?;
		tokio::fs::write(&staging, encoded)
			.await
			.map_err(|source| CacheError::Io { path: staging.clone(), source })?;
		tokio::fs::rename(&staging, &path)
			.await
			.map_err(|source| CacheError::Io { path: path.clone(), source })?;
		Ok(())
	}
}
