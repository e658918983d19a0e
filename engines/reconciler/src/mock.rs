use client_feeds::{FeedSummary, FetchOutcome, FetchResultBundle};
use relay_primitives::{FeedKind, FeedPayload};
use serde_json::Value;
use std::collections::BTreeMap;

pub use client_feeds::mock::{
	bandwidth_body, consensus_body, details_body, relay, uptime_body, validation_body,
};

/// Assembles a bundle from raw bodies, the way the coordinator would after a successful run.
pub struct BundleBuilder {
	relays: Vec<Value>,
	optional: BTreeMap<FeedKind, Vec<u8>>,
}

impl BundleBuilder {
	pub fn new(relays: Vec<Value>) -> Self {
		Self { relays, optional: BTreeMap::new() }
	}

	pub fn with(mut self, feed: FeedKind, body: Vec<u8>) -> Self {
		self.optional.insert(feed, body);
		self
	}

	pub fn build(self) -> FetchResultBundle {
		let details = match FeedPayload::parse(FeedKind::Details, &details_body(self.relays)) {
			Ok(FeedPayload::Details(doc)) => doc,
			other => panic!("fixture details did not parse: {:?}", other),
		};

		let mut optional = BTreeMap::new();
		let mut summaries = Vec::new();
		for (feed, body) in self.optional {
			let payload = FeedPayload::parse(feed, &body).expect("fixture payload parses");
			summaries.push(FeedSummary {
				feed,
				outcome: FetchOutcome::Fresh,
				stale: false,
				entries: payload.entry_count(),
				fetched_at: None,
				failure: None,
			});
			optional.insert(feed, payload);
		}

		FetchResultBundle { details, optional, summaries, degraded: Vec::new() }
	}
}
