use relay_primitives::FeedKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bookkeeping of everything the reconciler kept, merged or dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
	pub details_entries: usize,
	pub nodes: usize,
	pub operators: usize,
	pub singleton_operators: usize,
	pub dropped_empty_identity: usize,
	pub dropped_duplicate_identity: usize,
	/// Optional-feed entries joined onto a node.
	pub merged: BTreeMap<FeedKind, usize>,
	/// Optional-feed entries whose identity is not in the details feed.
	pub unmatched: BTreeMap<FeedKind, usize>,
	/// History windows with a key that is not a known look-back window.
	pub ignored_windows: usize,
}

impl ReconcileReport {
	pub fn unmatched_total(&self) -> usize {
		self.unmatched.values().sum()
	}

	pub(crate) fn record_merge(&mut self, feed: FeedKind, matched: bool) {
		let counter = if matched { &mut self.merged } else { &mut self.unmatched };
		*counter.entry(feed).or_default() += 1;
	}
}
