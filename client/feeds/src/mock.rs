//! Scripted transport and payload builders shared by the tests of this crate and its dependents.

use crate::cache::RevalidationToken;
use crate::transport::{FeedTransport, TransportError, TransportResponse};
use async_trait::async_trait;
use core::time::Duration;
use relay_primitives::{FeedConfig, FeedDescriptor, FeedKind, RunConfig};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

pub const DETAILS_URL: &str = "http://feeds.test/details";
pub const UPTIME_URL: &str = "http://feeds.test/uptime";
pub const BANDWIDTH_URL: &str = "http://feeds.test/bandwidth";
pub const VALIDATION_URL: &str = "http://feeds.test/validation";
pub const CONSENSUS_URL: &str = "http://feeds.test/consensus";

pub fn url_for(feed: FeedKind) -> &'static str {
	match feed {
		FeedKind::Details => DETAILS_URL,
		FeedKind::Uptime => UPTIME_URL,
		FeedKind::Bandwidth => BANDWIDTH_URL,
		FeedKind::Validation => VALIDATION_URL,
		FeedKind::Consensus => CONSENSUS_URL,
	}
}

struct Step {
	delay: Option<Duration>,
	result: Result<TransportResponse, TransportError>,
}

#[derive(Default)]
struct Script {
	steps: BTreeMap<String, VecDeque<Step>>,
	/// Served once the per-url steps are exhausted.
	standing: BTreeMap<String, Vec<u8>>,
	calls: BTreeMap<String, usize>,
	tokens: BTreeMap<String, Vec<Option<RevalidationToken>>>,
}

/// In-memory transport answering from a per-url script. Unscripted urls are unreachable.
#[derive(Default)]
pub struct ScriptedTransport {
	script: Mutex<Script>,
}

impl ScriptedTransport {
	pub fn new() -> Self {
		Self::default()
	}

	/// Serves `body` for every request to `url` that has no queued step.
	pub fn serve(&self, url: &str, body: Vec<u8>) -> &Self {
		self.with(|script| {
			script.standing.insert(url.to_string(), body);
		});
		self
	}

	pub fn push(&self, url: &str, result: Result<TransportResponse, TransportError>) -> &Self {
		self.push_step(url, Step { delay: None, result })
	}

	pub fn push_delayed(
		&self,
		url: &str,
		delay: Duration,
		result: Result<TransportResponse, TransportError>,
	) -> &Self {
		self.push_step(url, Step { delay: Some(delay), result })
	}

	/// Stops serving anything for `url`.
	pub fn take_down(&self, url: &str) -> &Self {
		self.with(|script| {
			script.standing.remove(url);
			script.steps.remove(url);
		});
		self
	}

	pub fn calls(&self, url: &str) -> usize {
		self.with(|script| script.calls.get(url).copied().unwrap_or_default())
	}

	pub fn total_calls(&self) -> usize {
		self.with(|script| script.calls.values().sum())
	}

	/// Revalidation tokens sent to `url`, in request order.
	pub fn tokens(&self, url: &str) -> Vec<Option<RevalidationToken>> {
		self.with(|script| script.tokens.get(url).cloned().unwrap_or_default())
	}

	fn push_step(&self, url: &str, step: Step) -> &Self {
		self.with(|script| script.steps.entry(url.to_string()).or_default().push_back(step));
		self
	}

	fn with<R>(&self, f: impl FnOnce(&mut Script) -> R) -> R {
		let mut guard = self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
		f(&mut guard)
	}
}

#[async_trait]
impl FeedTransport for ScriptedTransport {
	async fn fetch(
		&self,
		url: &str,
		token: Option<&RevalidationToken>,
		_timeout: Duration,
	) -> Result<TransportResponse, TransportError> {
		let step = self.with(|script| {
			*script.calls.entry(url.to_string()).or_default() += 1;
			script.tokens.entry(url.to_string()).or_default().push(token.cloned());
			match script.steps.get_mut(url).and_then(VecDeque::pop_front) {
				Some(step) => step,
				None => match script.standing.get(url) {
					Some(body) => Step { delay: None, result: Ok(body_response(body.clone())) },
					None => Step {
						delay: None,
						result: Err(TransportError::Connect(format!("{} unreachable", url))),
					},
				},
			}
		});

		if let Some(delay) = step.delay {
			tokio::time::sleep(delay).await;
		}
		step.result
	}
}

/// A 200 response tagged with an etag derived from the body length.
pub fn body_response(bytes: Vec<u8>) -> TransportResponse {
	let token = RevalidationToken { etag: Some(format!("\"{}\"", bytes.len())), last_modified: None };
	TransportResponse::Body { bytes, token }
}

/// Run configuration pointing every feed at the scripted urls.
pub fn test_config() -> RunConfig {
	let mut config = RunConfig::default();
	config.feeds = FeedKind::ALL
		.iter()
		.map(|kind| {
			let defaults = kind.default_config();
			(*kind, FeedConfig { url: url_for(*kind).to_string(), ..defaults })
		})
		.collect();
	config.retry_backoff_ms = 10;
	config
}

pub fn descriptor(feed: FeedKind) -> FeedDescriptor {
	FeedDescriptor::new(feed, &FeedConfig { url: url_for(feed).to_string(), ..feed.default_config() })
}

/// One details-feed relay. Capacities are observed, advertised and consensus weight.
pub fn relay(
	fingerprint: &str,
	contact: Option<&str>,
	capacities: (u64, u64, u64),
	country: &str,
	provider: &str,
) -> Value {
	let (observed, advertised, weight) = capacities;
	json!({
		"fingerprint": fingerprint,
		"nickname": format!("relay{}", fingerprint),
		"contact": contact,
		"observed_bandwidth": observed,
		"advertised_bandwidth": advertised,
		"consensus_weight": weight,
		"flags": ["Fast", "Running", "Stable", "Valid"],
		"country": country,
		"country_name": country.to_ascii_uppercase(),
		"as": provider,
		"as_name": format!("{} hosting", provider),
		"platform": "Tor 0.4.8.12 on Linux",
		"first_seen": "2019-05-01 00:00:00",
		"last_seen": "2024-06-01 12:00:00",
		"running": true,
	})
}

pub fn details_body(relays: Vec<Value>) -> Vec<u8> {
	json!({ "relays_published": "2024-06-01 12:00:00", "relays": relays }).to_string().into_bytes()
}

pub fn history(values: &[Option<u16>]) -> Value {
	json!({
		"first": "2024-05-01 00:00:00",
		"last": "2024-06-01 00:00:00",
		"interval": 14_400,
		"factor": 1.0,
		"count": values.len(),
		"values": values,
	})
}

/// Uptime document with one window per relay.
pub fn uptime_body(entries: &[(&str, &str, Vec<Option<u16>>)]) -> Vec<u8> {
	let relays: Vec<Value> = entries
		.iter()
		.map(|(fingerprint, window, values)| {
			let mut windows = Map::new();
			windows.insert(window.to_string(), history(values));
			json!({ "fingerprint": fingerprint, "uptime": windows })
		})
		.collect();
	json!({ "relays": relays }).to_string().into_bytes()
}

pub fn bandwidth_body(entries: &[(&str, &str, Vec<Option<u16>>)]) -> Vec<u8> {
	let relays: Vec<Value> = entries
		.iter()
		.map(|(fingerprint, window, values)| {
			let mut windows = Map::new();
			windows.insert(window.to_string(), history(values));
			json!({ "fingerprint": fingerprint, "write_history": windows })
		})
		.collect();
	json!({ "relays": relays }).to_string().into_bytes()
}

pub fn validation_body(entries: &[(&str, bool)]) -> Vec<u8> {
	let results: Vec<Value> = entries
		.iter()
		.map(|(fingerprint, valid)| json!({ "fingerprint": fingerprint, "valid": valid, "proof_type": "uri-rsa" }))
		.collect();
	json!({ "results": results }).to_string().into_bytes()
}

pub fn consensus_body(entries: &[(&str, u32)]) -> Vec<u8> {
	let relays: Vec<Value> = entries
		.iter()
		.map(|(fingerprint, votes)| json!({ "fingerprint": fingerprint, "authority_votes": votes, "measured": true }))
		.collect();
	json!({ "relays": relays }).to_string().into_bytes()
}
