use crate::feeds::{FeedConfig, FeedDescriptor, FeedKind};
use core::time::Duration;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Parts-per-million scale used for exact threshold comparisons.
pub const PPM_SCALE: u64 = 1_000_000;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read config {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("failed to parse config {path}: {source}")]
	Parse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},
	#[error("invalid configuration: {0}")]
	Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReliabilityConfig {
	/// Windows with fewer present samples report insufficient data.
	pub min_samples: usize,
	/// Operators need this many scored members to be ranked on uptime.
	pub min_operator_size: usize,
	/// Absolute z-score above which a node is flagged within its cohort.
	pub outlier_z: f64,
}

impl Default for ReliabilityConfig {
	fn default() -> Self {
		Self { min_samples: 30, min_operator_size: 25, outlier_z: 2.0 }
	}
}

/// Immutable per-run configuration snapshot, passed by reference into every stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
	/// Feeds to fetch. An optional feed missing here is reported as degraded.
	pub feeds: BTreeMap<FeedKind, FeedConfig>,
	pub worker_pool_size: usize,
	pub run_timeout_secs: u64,
	pub retry_backoff_ms: u64,
	pub allow_stale_fallback: bool,
	pub cache_dir: PathBuf,
	pub reliability: ReliabilityConfig,
	/// Share of total effective capacity above which a bucket is a concentration risk.
	pub concentration_threshold: f64,
	/// Residual spread, in standard deviations, that marks a geographic cluster.
	pub clustering_sigma: f64,
	pub top_n: usize,
	pub leaderboard_size: usize,
}

impl Default for RunConfig {
	fn default() -> Self {
		Self {
			feeds: FeedKind::ALL.iter().map(|kind| (*kind, kind.default_config())).collect(),
			worker_pool_size: 4,
			run_timeout_secs: 300,
			retry_backoff_ms: 500,
			allow_stale_fallback: true,
			cache_dir: PathBuf::from(".relaywatch-cache"),
			reliability: ReliabilityConfig::default(),
			concentration_threshold: 0.05,
			clustering_sigma: 2.0,
			top_n: 10,
			leaderboard_size: 25,
		}
	}
}

impl RunConfig {
	pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
		let raw = std::fs::read(path)
			.map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
		serde_json::from_slice(&raw)
			.map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if !self.feeds.contains_key(&FeedKind::Details) {
			return Err(ConfigError::Invalid("the details feed must be configured".into()));
		}
		for (kind, feed) in &self.feeds {
			if feed.url.trim().is_empty() {
				return Err(ConfigError::Invalid(format!("{} feed has an empty url", kind)));
			}
			if feed.timeout_secs == 0 {
				return Err(ConfigError::Invalid(format!("{} feed timeout must be positive", kind)));
			}
		}
		if self.worker_pool_size == 0 {
			return Err(ConfigError::Invalid("worker pool size must be at least 1".into()));
		}
		if self.run_timeout_secs == 0 {
			return Err(ConfigError::Invalid("run timeout must be positive".into()));
		}
		if !(self.concentration_threshold > 0.0 && self.concentration_threshold <= 1.0) {
			return Err(ConfigError::Invalid(format!(
				"concentration threshold {} is outside (0, 1]",
				self.concentration_threshold
			)));
		}
		if !(self.clustering_sigma.is_finite() && self.clustering_sigma > 0.0) {
			return Err(ConfigError::Invalid("clustering sigma must be positive".into()));
		}
		if !(self.reliability.outlier_z.is_finite() && self.reliability.outlier_z > 0.0) {
			return Err(ConfigError::Invalid("outlier z-score must be positive".into()));
		}
		if self.reliability.min_samples == 0 {
			return Err(ConfigError::Invalid("minimum sample count must be at least 1".into()));
		}
		Ok(())
	}

	/// Configured feeds in dispatch order.
	pub fn feed_set(&self) -> Vec<FeedDescriptor> {
		self.feeds.iter().map(|(kind, config)| FeedDescriptor::new(*kind, config)).collect()
	}

	pub fn run_timeout(&self) -> Duration {
		Duration::from_secs(self.run_timeout_secs)
	}

	pub fn retry_backoff(&self) -> Duration {
		Duration::from_millis(self.retry_backoff_ms)
	}

	/// The concentration threshold as an integer share of [`PPM_SCALE`].
	pub fn concentration_threshold_ppm(&self) -> u64 {
		(self.concentration_threshold * PPM_SCALE as f64).round() as u64
	}
}
