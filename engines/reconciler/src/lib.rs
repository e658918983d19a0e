//! # Reconciler
//!
//! Turns the fetched feed documents into the unified [`Node`] and [`Operator`](relay_primitives::Operator) model.
//!
//! The details feed is authoritative: it is indexed first and is the only source that can create
//! a node. Every optional feed is then joined onto that index by node identity in a single pass.
//! Entries of an optional feed that do not match a known node are dropped and counted, since
//! stale or renamed identities are routine in the upstream data.
//!
//! Nodes without a usable declared operator become singleton operators of their own; they are
//! never lumped together into one synthetic bucket.

use chrono::NaiveDateTime;
use client_feeds::FetchResultBundle;
use relay_primitives::documents::{
	BandwidthDocument, ConsensusDocument, History, RelayDetails, UptimeDocument, ValidationDocument,
};
use relay_primitives::{
	ConsensusStatus, FeedKind, FeedPayload, Location, Node, NodeId, NodeSet, OperatorSet, ProofMethod,
	RoleFlags, SampleSeries, ValidationStatus, Window,
};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

mod types;
pub use relay_primitives::group_operators;
pub use types::ReconcileReport;

#[cfg(test)]
mod mock;


pub fn reconcile(bundle: &FetchResultBundle) -> (NodeSet, OperatorSet, ReconcileReport) {
	let mut report = ReconcileReport::default();
	let mut nodes = index_details(&bundle.details.relays, &mut report);

	for payload in bundle.optional.values() {
		match payload {
			FeedPayload::Uptime(doc) => merge_uptime(&mut nodes, doc, &mut report),
			FeedPayload::Bandwidth(doc) => merge_bandwidth(&mut nodes, doc, &mut report),
			FeedPayload::Validation(doc) => merge_validation(&mut nodes, doc, &mut report),
			FeedPayload::Consensus(doc) => merge_consensus(&mut nodes, doc, &mut report),
			FeedPayload::Details(_) => {
				log::warn!("⚠️ Ignoring a second details payload in the optional feed set")
			},
		}
	}

	for (feed, count) in &report.unmatched {
		log::warn!("⚠️ Dropped {} {} entries with no matching node", count, feed);
	}

	let operators = group_operators(&nodes);
	report.nodes = nodes.len();
	report.operators = operators.len();
	report.singleton_operators = operators.keys().filter(|id| id.is_singleton()).count();

	log::info!(
		"✅ Reconciled {} nodes into {} operators ({} singletons)",
		report.nodes,
		report.operators,
		report.singleton_operators
	);

	(nodes, operators, report)
}

fn index_details(relays: &[RelayDetails], report: &mut ReconcileReport) -> NodeSet {
	let mut nodes = NodeSet::new();
	report.details_entries = relays.len();

	for relay in relays {
		let fingerprint = relay.fingerprint.trim();
		if fingerprint.is_empty() {
			report.dropped_empty_identity += 1;
			continue;
		}
		match nodes.entry(NodeId::new(fingerprint)) {
			Entry::Occupied(entry) => {
				log::warn!("⚠️ Duplicate details entry for {}, keeping the first", entry.key());
				report.dropped_duplicate_identity += 1;
			},
			Entry::Vacant(entry) => {
				let node = node_from_details(entry.key().clone(), relay);
				entry.insert(node);
			},
		}
	}

	if report.dropped_empty_identity > 0 {
		log::warn!("⚠️ Dropped {} details entries without an identity", report.dropped_empty_identity);
	}
	nodes
}

fn node_from_details(id: NodeId, relay: &RelayDetails) -> Node {
	Node {
		id,
		nickname: relay.nickname.clone(),
		declared_operator: relay.contact.clone(),
		observed_capacity: relay.observed_bandwidth,
		advertised_capacity: relay.advertised_bandwidth,
		weight: relay.consensus_weight,
		roles: RoleFlags::from_flag_names(&relay.flags),
		location: Location {
			country: relay.country.clone(),
			country_name: relay.country_name.clone(),
			provider: relay.as_number.clone(),
			provider_name: relay.as_name.clone(),
		},
		platform: relay.platform.clone(),
		first_seen: utc(relay.first_seen),
		last_seen: utc(relay.last_seen),
		running: relay.running,
		uptime: BTreeMap::new(),
		bandwidth: BTreeMap::new(),
		validation: None,
		consensus: None,
	}
}

fn utc(time: NaiveDateTime) -> chrono::DateTime<chrono::Utc> {
	time.and_utc()
}

fn windowed(
	histories: &BTreeMap<String, History>,
	report: &mut ReconcileReport,
) -> BTreeMap<Window, SampleSeries> {
	let mut series = BTreeMap::new();
	for (key, history) in histories {
		match Window::from_feed_key(key) {
			Some(window) => {
				series.insert(window, SampleSeries::from_history(history));
			},
			None => report.ignored_windows += 1,
		}
	}
	series
}

fn merge_uptime(nodes: &mut NodeSet, doc: &UptimeDocument, report: &mut ReconcileReport) {
	for entry in &doc.relays {
		let series = windowed(&entry.uptime, report);
		let node = nodes.get_mut(&NodeId::new(entry.fingerprint.trim()));
		report.record_merge(FeedKind::Uptime, node.is_some());
		if let Some(node) = node {
			node.uptime.extend(series);
		}
	}
}

fn merge_bandwidth(nodes: &mut NodeSet, doc: &BandwidthDocument, report: &mut ReconcileReport) {
	for entry in &doc.relays {
		let series = windowed(&entry.write_history, report);
		let node = nodes.get_mut(&NodeId::new(entry.fingerprint.trim()));
		report.record_merge(FeedKind::Bandwidth, node.is_some());
		if let Some(node) = node {
			node.bandwidth.extend(series);
		}
	}
}

fn merge_validation(nodes: &mut NodeSet, doc: &ValidationDocument, report: &mut ReconcileReport) {
	for entry in &doc.results {
		let node = nodes.get_mut(&NodeId::new(entry.fingerprint.trim()));
		report.record_merge(FeedKind::Validation, node.is_some());
		if let Some(node) = node {
			node.validation = Some(ValidationStatus {
				validated: entry.valid,
				proof: ProofMethod::from_feed(entry.proof_type.as_deref()),
			});
		}
	}
}

fn merge_consensus(nodes: &mut NodeSet, doc: &ConsensusDocument, report: &mut ReconcileReport) {
	for entry in &doc.relays {
		let node = nodes.get_mut(&NodeId::new(entry.fingerprint.trim()));
		report.record_merge(FeedKind::Consensus, node.is_some());
		if let Some(node) = node {
			node.consensus =
				Some(ConsensusStatus { authority_votes: entry.authority_votes, measured: entry.measured });
		}
	}
}
