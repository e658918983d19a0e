use core::fmt;
use core::time::Duration;
use serde::{Deserialize, Serialize};

/// Identity of one independently-updated external feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
	Details,
	Uptime,
	Bandwidth,
	Validation,
	Consensus,
}

impl FeedKind {
	pub const ALL: [FeedKind; 5] = [
		FeedKind::Details,
		FeedKind::Uptime,
		FeedKind::Bandwidth,
		FeedKind::Validation,
		FeedKind::Consensus,
	];

	/// Only the node-details feed is required; every other feed degrades one capability.
	pub fn is_required(&self) -> bool {
		matches!(self, FeedKind::Details)
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			FeedKind::Details => "details",
			FeedKind::Uptime => "uptime",
			FeedKind::Bandwidth => "bandwidth",
			FeedKind::Validation => "validation",
			FeedKind::Consensus => "consensus",
		}
	}

	/// Human readable name of the capability lost when this feed is unavailable.
	pub fn capability(&self) -> &'static str {
		match self {
			FeedKind::Details => "node inventory",
			FeedKind::Uptime => "reliability scoring",
			FeedKind::Bandwidth => "throughput history",
			FeedKind::Validation => "operator validation",
			FeedKind::Consensus => "consensus coverage",
		}
	}

	pub fn default_config(&self) -> FeedConfig {
		let (url, ttl_secs, timeout_secs) = match self {
			FeedKind::Details => ("https://onionoo.torproject.org/details", 3_600, 30),
			FeedKind::Uptime => ("https://onionoo.torproject.org/uptime", 21_600, 60),
			FeedKind::Bandwidth => ("https://onionoo.torproject.org/bandwidth", 21_600, 60),
			FeedKind::Validation => ("http://127.0.0.1:8088/validation/latest.json", 21_600, 20),
			FeedKind::Consensus => ("http://127.0.0.1:8088/consensus/latest.json", 3_600, 20),
		};
		FeedConfig { url: url.to_string(), ttl_secs, timeout_secs }
	}
}

impl fmt::Display for FeedKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Per-feed settings as they appear in the configuration file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
	pub url: String,
	pub ttl_secs: u64,
	pub timeout_secs: u64,
}

/// A feed ready to be dispatched: its identity plus the resolved endpoint and limits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedDescriptor {
	pub kind: FeedKind,
	pub url: String,
	pub ttl: Duration,
	pub timeout: Duration,
}

impl FeedDescriptor {
	pub fn new(kind: FeedKind, config: &FeedConfig) -> Self {
		Self {
			kind,
			url: config.url.clone(),
			ttl: Duration::from_secs(config.ttl_secs),
			timeout: Duration::from_secs(config.timeout_secs),
		}
	}

	pub fn required(&self) -> bool {
		self.kind.is_required()
	}
}
