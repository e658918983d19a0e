//! # Aggregate Statistics
//!
//! Computes the shared [`NetworkStatistics`] snapshot in one grouped pass over the node set.
//! Every capacity figure is the node's effective capacity, the minimum of its observed,
//! advertised and consensus-weight measurements.
//!
//! Concentration flags are decided in integer parts-per-million so the configured threshold is
//! inclusive and exact: with the default 5% a bucket at exactly 5.0% of total capacity is
//! flagged and one at 4.999% is not.

use itertools::Itertools;
use relay_primitives::config::PPM_SCALE;
use relay_primitives::{Dimension, NodeSet, RunConfig};
use std::collections::BTreeMap;

mod types;
pub use types::{Bucket, Distribution, NetworkStatistics, NetworkTotals, PercentileLadder};

#[cfg(test)]
mod mock;


pub fn compute(nodes: &NodeSet, config: &RunConfig) -> NetworkStatistics {
	let threshold_ppm = config.concentration_threshold_ppm();
	let mut totals = NetworkTotals::default();
	let mut capacities = Vec::with_capacity(nodes.len());
	let mut grouped: BTreeMap<Dimension, BTreeMap<String, (usize, u64)>> = BTreeMap::new();

	for node in nodes.values() {
		let capacity = node.effective_capacity();
		capacities.push(capacity);

		totals.node_count += 1;
		if node.running {
			totals.running_count += 1;
		}
		totals.observed_capacity = totals.observed_capacity.saturating_add(node.observed_capacity);
		totals.advertised_capacity = totals.advertised_capacity.saturating_add(node.advertised_capacity);
		totals.weight = totals.weight.saturating_add(node.weight);
		totals.effective_capacity = totals.effective_capacity.saturating_add(capacity);
		if node.roles.usable_exit() {
			totals.exit_count += 1;
			totals.exit_capacity = totals.exit_capacity.saturating_add(capacity);
		}
		if node.roles.guard {
			totals.guard_count += 1;
			totals.guard_capacity = totals.guard_capacity.saturating_add(capacity);
		}
		if node.consensus.map_or(false, |c| c.measured) {
			totals.consensus_measured += 1;
		}

		for dimension in Dimension::ALL {
			let bucket = grouped.entry(dimension).or_default().entry(dimension.bucket_key(node)).or_default();
			bucket.0 += 1;
			bucket.1 = bucket.1.saturating_add(capacity);
		}
	}

	capacities.sort_unstable();
	let percentiles = percentile_ladder(&capacities);

	let distributions = Dimension::ALL
		.into_iter()
		.map(|dimension| {
			let buckets = grouped.remove(&dimension).unwrap_or_default();
			let distribution = distribution(
				dimension,
				buckets,
				totals.effective_capacity,
				threshold_ppm,
				config.top_n,
			);
			(dimension, distribution)
		})
		.collect::<BTreeMap<_, _>>();

	for distribution in distributions.values() {
		let flagged = distribution.flagged().count();
		if flagged > 0 {
			log::info!(
				"⚠️ {} {} buckets at or above the concentration threshold (HHI {:.4})",
				flagged,
				distribution.dimension,
				distribution.hhi
			);
		}
	}
	log::info!(
		"✅ Aggregated {} nodes, total effective capacity {}",
		totals.node_count,
		totals.effective_capacity
	);

	NetworkStatistics {
		totals,
		percentiles,
		distributions,
		sorted_capacities: capacities,
		concentration_threshold_ppm: threshold_ppm,
	}
}

/// Whether `part` is at least `threshold_ppm` parts per million of `total`.
pub fn meets_share(part: u64, total: u64, threshold_ppm: u64) -> bool {
	if total == 0 {
		return false;
	}
	(part as u128) * (PPM_SCALE as u128) >= (threshold_ppm as u128) * (total as u128)
}

pub fn share_ppm(part: u64, total: u64) -> u64 {
	if total == 0 {
		return 0;
	}
	((part as u128) * (PPM_SCALE as u128) / (total as u128)) as u64
}

fn distribution(
	dimension: Dimension,
	buckets: BTreeMap<String, (usize, u64)>,
	total: u64,
	threshold_ppm: u64,
	top_n: usize,
) -> Distribution {
	let hhi = if total == 0 {
		0.0
	} else {
		buckets
			.values()
			.map(|(_, capacity)| {
				let share = *capacity as f64 / total as f64;
				share * share
			})
			.sum()
	};

	let buckets: Vec<Bucket> = buckets
		.into_iter()
		.map(|(key, (node_count, capacity))| Bucket {
			key,
			node_count,
			capacity,
			share_ppm: share_ppm(capacity, total),
			flagged: meets_share(capacity, total, threshold_ppm),
		})
		.sorted_by(|a, b| b.capacity.cmp(&a.capacity).then_with(|| a.key.cmp(&b.key)))
		.collect();
	let top = buckets.iter().take(top_n).cloned().collect();

	Distribution { dimension, buckets, top, hhi }
}

/// Nearest-rank percentiles over an ascending slice.
pub fn percentile_ladder(sorted: &[u64]) -> Option<PercentileLadder> {
	if sorted.is_empty() {
		return None;
	}
	let at = |p: usize| {
		let rank = (p * sorted.len() + 99) / 100;
		sorted[rank.clamp(1, sorted.len()) - 1]
	};
	Some(PercentileLadder { p5: at(5), p25: at(25), p50: at(50), p75: at(75), p95: at(95), p99: at(99) })
}
