use relay_primitives::Dimension;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkTotals {
	pub node_count: usize,
	pub running_count: usize,
	pub observed_capacity: u64,
	pub advertised_capacity: u64,
	pub weight: u64,
	pub effective_capacity: u64,
	pub exit_count: usize,
	pub exit_capacity: u64,
	pub guard_count: usize,
	pub guard_capacity: u64,
	pub consensus_measured: usize,
}

/// Nearest-rank percentiles of effective capacity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PercentileLadder {
	pub p5: u64,
	pub p25: u64,
	pub p50: u64,
	pub p75: u64,
	pub p95: u64,
	pub p99: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
	pub key: String,
	pub node_count: usize,
	pub capacity: u64,
	/// Share of total effective capacity in parts per million, rounded down.
	pub share_ppm: u64,
	pub flagged: bool,
}

impl Bucket {
	pub fn share(&self) -> f64 {
		self.share_ppm as f64 / relay_primitives::config::PPM_SCALE as f64
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
	pub dimension: Dimension,
	/// Every bucket, largest capacity first, key ascending on ties.
	pub buckets: Vec<Bucket>,
	/// The first `top_n` entries of `buckets`.
	pub top: Vec<Bucket>,
	/// Herfindahl-Hirschman index: sum of squared capacity shares, in [0, 1].
	pub hhi: f64,
}

impl Distribution {
	pub fn flagged(&self) -> impl Iterator<Item = &Bucket> {
		self.buckets.iter().filter(|b| b.flagged)
	}

	pub fn bucket(&self, key: &str) -> Option<&Bucket> {
		self.buckets.iter().find(|b| b.key == key)
	}
}

/// Immutable per-run snapshot computed once after reconciliation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkStatistics {
	pub totals: NetworkTotals,
	/// `None` for an empty network.
	pub percentiles: Option<PercentileLadder>,
	pub distributions: BTreeMap<Dimension, Distribution>,
	/// Effective capacity of every node, ascending.
	pub sorted_capacities: Vec<u64>,
	pub concentration_threshold_ppm: u64,
}

impl NetworkStatistics {
	pub fn distribution(&self, dimension: Dimension) -> Option<&Distribution> {
		self.distributions.get(&dimension)
	}

	pub fn hhi(&self, dimension: Dimension) -> f64 {
		self.distribution(dimension).map_or(0.0, |d| d.hhi)
	}
}
