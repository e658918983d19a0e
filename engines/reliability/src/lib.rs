//! # Reliability Engine
//!
//! Normalizes each node's sparse uptime history per look-back window and rolls the results up
//! into capacity-weighted operator portfolio scores.
//!
//! - Gaps in a series are skipped, never counted as zero.
//! - A window with fewer than `min_samples` present samples reports
//!   [`UptimeValue::InsufficientData`].
//! - An operator is eligible for uptime rankings only once `min_operator_size` of its members
//!   have a computed value.
//! - Nodes are grouped into cohorts along every [`Dimension`] (country, provider, operator and
//!   platform). A node further than `outlier_z` standard deviations from the mean of any of its
//!   cohorts is flagged. Flagged nodes still count towards the portfolio score.

use relay_primitives::node::UNKNOWN_BUCKET;
use relay_primitives::{
	Dimension, Node, NodeId, NodeSet, OperatorId, OperatorSet, ReliabilityConfig, SampleSeries, Window,
	UPTIME_SCALE_MAX,
};
use std::collections::BTreeMap;

mod types;
pub use types::{
	NodeReliability, NodeWindowRecord, OperatorWindowScore, ReliabilityReport, UptimeValue,
};

#[cfg(test)]
mod mock;


/// Smallest cohort for which a z-score is meaningful.
const MIN_COHORT: usize = 3;

/// Cohort spread below this is treated as no spread at all.
const MIN_STDDEV: f64 = 1e-9;

pub fn score(nodes: &NodeSet, operators: &OperatorSet, config: &ReliabilityConfig) -> ReliabilityReport {
	let mut node_records: BTreeMap<NodeId, NodeReliability> = nodes
		.values()
		.map(|node| {
			let windows = Window::ALL
				.into_iter()
				.map(|window| (window, node_window(node, window, config.min_samples)))
				.collect();
			(node.id.clone(), NodeReliability { operator: node.operator_id(), windows })
		})
		.collect();

	for window in Window::ALL {
		for dimension in Dimension::ALL {
			flag_cohorts(nodes, dimension, window, config.outlier_z, &mut node_records);
		}
	}

	let mut operator_scores: BTreeMap<OperatorId, BTreeMap<Window, OperatorWindowScore>> =
		BTreeMap::new();
	for (id, operator) in operators {
		let members: Vec<&Node> = operator.members.iter().filter_map(|m| nodes.get(m)).collect();
		let mut windows = BTreeMap::new();

		for window in Window::ALL {
			let computed: Vec<(&Node, f64)> = members
				.iter()
				.filter_map(|node| {
					let record = node_records.get(&node.id)?.windows.get(&window)?;
					record.uptime.percentage().map(|value| (*node, value))
				})
				.collect();

			let contributing = computed.len();
			windows.insert(
				window,
				OperatorWindowScore {
					score: portfolio_score(&computed),
					contributing,
					member_count: members.len(),
					eligible: contributing > 0 && contributing >= config.min_operator_size,
				},
			);
		}
		operator_scores.insert(id.clone(), windows);
	}

	for window in Window::ALL {
		let eligible = operator_scores
			.values()
			.filter(|windows| windows.get(&window).map_or(false, |s| s.eligible))
			.count();
		log::debug!("{} operators eligible for {} reliability", eligible, window);
	}
	log::info!("✅ Scored reliability for {} nodes and {} operators", node_records.len(), operator_scores.len());

	ReliabilityReport { thresholds: config.clone(), nodes: node_records, operators: operator_scores }
}

fn node_window(node: &Node, window: Window, min_samples: usize) -> NodeWindowRecord {
	let (uptime, sample_count) = match node.uptime.get(&window) {
		Some(series) => (normalized_uptime(series, min_samples), series.present_count()),
		None => (UptimeValue::InsufficientData { samples: 0, required: min_samples }, 0),
	};
	NodeWindowRecord {
		uptime,
		sample_count,
		cohort_z: BTreeMap::new(),
		outlier: false,
		mean_throughput: node.bandwidth.get(&window).and_then(mean_throughput),
	}
}

/// Share of the scale maximum reached by the present samples, as a percentage.
pub fn normalized_uptime(series: &SampleSeries, min_samples: usize) -> UptimeValue {
	let present = series.present_count();
	if present < min_samples || present == 0 {
		return UptimeValue::InsufficientData { samples: present, required: min_samples };
	}
	let value = series.present_sum() as f64 / (present as f64 * UPTIME_SCALE_MAX as f64) * 100.0;
	UptimeValue::Percentage { value }
}

pub fn mean_throughput(series: &SampleSeries) -> Option<f64> {
	let present = series.present_count();
	if present == 0 {
		return None;
	}
	Some(series.present_sum() as f64 / present as f64 * series.factor)
}

/// Mean weighted by effective capacity; a plain mean when no member has capacity.
fn portfolio_score(computed: &[(&Node, f64)]) -> Option<f64> {
	if computed.is_empty() {
		return None;
	}
	let total_weight =
		computed.iter().fold(0u64, |acc, (node, _)| acc.saturating_add(node.effective_capacity()));
	if total_weight == 0 {
		return Some(computed.iter().map(|(_, value)| value).sum::<f64>() / computed.len() as f64);
	}
	let weighted: f64 =
		computed.iter().map(|(node, value)| node.effective_capacity() as f64 * value).sum();
	Some(weighted / total_weight as f64)
}

/// Groups the nodes with a computed value by their bucket along `dimension`. The unknown bucket
/// is not a cohort.
fn flag_cohorts(
	nodes: &NodeSet,
	dimension: Dimension,
	window: Window,
	threshold: f64,
	records: &mut BTreeMap<NodeId, NodeReliability>,
) {
	let mut cohorts: BTreeMap<String, Vec<(&NodeId, f64)>> = BTreeMap::new();
	for node in nodes.values() {
		let value = records
			.get(&node.id)
			.and_then(|r| r.windows.get(&window))
			.and_then(|record| record.uptime.percentage());
		let Some(value) = value else { continue };
		let key = dimension.bucket_key(node);
		if key != UNKNOWN_BUCKET {
			cohorts.entry(key).or_default().push((&node.id, value));
		}
	}

	for members in cohorts.values() {
		flag_cohort(members, dimension, window, threshold, records);
	}
}

fn flag_cohort(
	members: &[(&NodeId, f64)],
	dimension: Dimension,
	window: Window,
	threshold: f64,
	records: &mut BTreeMap<NodeId, NodeReliability>,
) {
	if members.len() < MIN_COHORT {
		return;
	}
	let n = members.len() as f64;
	let mean = members.iter().map(|(_, v)| v).sum::<f64>() / n;
	let stddev = (members.iter().map(|(_, v)| (v - mean) * (v - mean)).sum::<f64>() / n).sqrt();
	if stddev < MIN_STDDEV {
		return;
	}

	for (id, value) in members {
		let z = (value - mean) / stddev;
		if let Some(record) = records.get_mut(*id).and_then(|r| r.windows.get_mut(&window)) {
			record.cohort_z.insert(dimension, z);
			if z.abs() > threshold {
				record.outlier = true;
				log::debug!("{} is a {} uptime outlier by {} (z = {:.2})", id, window, dimension, z);
			}
		}
	}
}
