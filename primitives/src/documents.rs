//! Typed views of the raw feed payloads.
//!
//! Every payload is parsed and checked here before it leaves the fetch layer, so schema drift in
//! an upstream feed shows up as a [`SchemaError`] at the fetch boundary and never as a panic in a
//! downstream engine.

use crate::feeds::FeedKind;
use crate::node::UPTIME_SCALE_MAX;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
	#[error("{feed} payload could not be decoded: {source}")]
	Malformed {
		feed: FeedKind,
		#[source]
		source: serde_json::Error,
	},
	#[error("{feed} payload violates its schema: {reason}")]
	Invalid { feed: FeedKind, reason: String },
}

/// `YYYY-MM-DD HH:MM:SS` timestamps as published by the feeds.
pub mod feed_time {
	use chrono::NaiveDateTime;
	use serde::{Deserialize, Deserializer, Serializer};

	pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

	pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&value.format(FORMAT).to_string())
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
		let raw = String::deserialize(deserializer)?;
		NaiveDateTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetailsDocument {
	#[serde(with = "feed_time")]
	pub relays_published: NaiveDateTime,
	#[serde(default)]
	pub relays: Vec<RelayDetails>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelayDetails {
	pub fingerprint: String,
	#[serde(default)]
	pub nickname: Option<String>,
	#[serde(default)]
	pub contact: Option<String>,
	#[serde(default)]
	pub observed_bandwidth: u64,
	#[serde(default)]
	pub advertised_bandwidth: u64,
	#[serde(default)]
	pub consensus_weight: u64,
	#[serde(default)]
	pub flags: Vec<String>,
	#[serde(default)]
	pub country: Option<String>,
	#[serde(default)]
	pub country_name: Option<String>,
	#[serde(default, rename = "as")]
	pub as_number: Option<String>,
	#[serde(default)]
	pub as_name: Option<String>,
	#[serde(default)]
	pub platform: Option<String>,
	#[serde(with = "feed_time")]
	pub first_seen: NaiveDateTime,
	#[serde(with = "feed_time")]
	pub last_seen: NaiveDateTime,
	#[serde(default)]
	pub running: bool,
}

/// One look-back window of a sparse history. `None` values are gaps, never zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct History {
	#[serde(with = "feed_time")]
	pub first: NaiveDateTime,
	#[serde(with = "feed_time")]
	pub last: NaiveDateTime,
	pub interval: u64,
	#[serde(default = "default_factor")]
	pub factor: f64,
	#[serde(default)]
	pub count: Option<u64>,
	#[serde(default)]
	pub values: Vec<Option<u16>>,
}

fn default_factor() -> f64 {
	1.0
}

impl History {
	fn check(&self) -> Result<(), String> {
		if self.interval == 0 {
			return Err("history interval must be positive".into());
		}
		if !self.factor.is_finite() || self.factor < 0.0 {
			return Err(format!("history factor {} is not a finite non-negative number", self.factor));
		}
		if self.first > self.last {
			return Err("history ends before it starts".into());
		}
		if let Some(value) = self.values.iter().flatten().find(|v| **v > UPTIME_SCALE_MAX) {
			return Err(format!("history sample {} exceeds the {} scale", value, UPTIME_SCALE_MAX));
		}
		Ok(())
	}
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UptimeDocument {
	#[serde(default)]
	pub relays: Vec<UptimeEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UptimeEntry {
	pub fingerprint: String,
	#[serde(default)]
	pub uptime: BTreeMap<String, History>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BandwidthDocument {
	#[serde(default)]
	pub relays: Vec<BandwidthEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BandwidthEntry {
	pub fingerprint: String,
	#[serde(default)]
	pub write_history: BTreeMap<String, History>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationDocument {
	#[serde(default)]
	pub results: Vec<ValidationEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationEntry {
	pub fingerprint: String,
	pub valid: bool,
	#[serde(default)]
	pub proof_type: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsensusDocument {
	#[serde(default)]
	pub relays: Vec<ConsensusEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsensusEntry {
	pub fingerprint: String,
	#[serde(default)]
	pub authority_votes: u32,
	#[serde(default)]
	pub measured: bool,
}

/// A parsed, schema-checked payload of one feed.
#[derive(Clone, Debug, PartialEq)]
pub enum FeedPayload {
	Details(DetailsDocument),
	Uptime(UptimeDocument),
	Bandwidth(BandwidthDocument),
	Validation(ValidationDocument),
	Consensus(ConsensusDocument),
}

impl FeedPayload {
	/// Decodes `bytes` as the document of `feed` and checks the invariants serde cannot express.
	pub fn parse(feed: FeedKind, bytes: &[u8]) -> Result<Self, SchemaError> {
		let malformed = |source| SchemaError::Malformed { feed, source };
		let payload = match feed {
			FeedKind::Details => FeedPayload::Details(serde_json::from_slice(bytes).map_err(malformed)?),
			FeedKind::Uptime => FeedPayload::Uptime(serde_json::from_slice(bytes).map_err(malformed)?),
			FeedKind::Bandwidth => {
				FeedPayload::Bandwidth(serde_json::from_slice(bytes).map_err(malformed)?)
			},
			FeedKind::Validation => {
				FeedPayload::Validation(serde_json::from_slice(bytes).map_err(malformed)?)
			},
			FeedKind::Consensus => {
				FeedPayload::Consensus(serde_json::from_slice(bytes).map_err(malformed)?)
			},
		};
		payload.validate()?;
		Ok(payload)
	}

	/// The substitute handed downstream when an optional feed is degraded.
	///
	/// Returns `None` for the details feed, which has no meaningful empty form.
	pub fn empty(feed: FeedKind) -> Option<Self> {
		match feed {
			FeedKind::Details => None,
			FeedKind::Uptime => Some(FeedPayload::Uptime(UptimeDocument::default())),
			FeedKind::Bandwidth => Some(FeedPayload::Bandwidth(BandwidthDocument::default())),
			FeedKind::Validation => Some(FeedPayload::Validation(ValidationDocument::default())),
			FeedKind::Consensus => Some(FeedPayload::Consensus(ConsensusDocument::default())),
		}
	}

	pub fn kind(&self) -> FeedKind {
		match self {
			FeedPayload::Details(_) => FeedKind::Details,
			FeedPayload::Uptime(_) => FeedKind::Uptime,
			FeedPayload::Bandwidth(_) => FeedKind::Bandwidth,
			FeedPayload::Validation(_) => FeedKind::Validation,
			FeedPayload::Consensus(_) => FeedKind::Consensus,
		}
	}

	/// Number of top-level entries, used for fetch summaries.
	pub fn entry_count(&self) -> usize {
		match self {
			FeedPayload::Details(doc) => doc.relays.len(),
			FeedPayload::Uptime(doc) => doc.relays.len(),
			FeedPayload::Bandwidth(doc) => doc.relays.len(),
			FeedPayload::Validation(doc) => doc.results.len(),
			FeedPayload::Consensus(doc) => doc.relays.len(),
		}
	}

	fn validate(&self) -> Result<(), SchemaError> {
		let feed = self.kind();
		let invalid = |reason: String| SchemaError::Invalid { feed, reason };
		match self {
			FeedPayload::Details(doc) => {
				if let Some(relay) = doc.relays.iter().find(|r| r.first_seen > r.last_seen) {
					return Err(invalid(format!("relay {} was last seen before it was first seen", relay.fingerprint)));
				}
			},
			FeedPayload::Uptime(doc) => {
				for entry in &doc.relays {
					for (window, history) in &entry.uptime {
						history
							.check()
							.map_err(|reason| invalid(format!("{} {}: {}", entry.fingerprint, window, reason)))?;
					}
				}
			},
			FeedPayload::Bandwidth(doc) => {
				for entry in &doc.relays {
					for (window, history) in &entry.write_history {
						history
							.check()
							.map_err(|reason| invalid(format!("{} {}: {}", entry.fingerprint, window, reason)))?;
					}
				}
			},
			FeedPayload::Validation(_) | FeedPayload::Consensus(_) => {},
		}
		Ok(())
	}
}
