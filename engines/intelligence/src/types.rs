use relay_primitives::{Dimension, NodeId, OperatorId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Concentration band for a Herfindahl-Hirschman index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiversityBand {
	High,
	Medium,
	Low,
}

impl DiversityBand {
	pub const HIGH_BELOW: f64 = 0.15;
	pub const MEDIUM_BELOW: f64 = 0.25;

	pub fn from_hhi(hhi: f64) -> Self {
		if hhi < Self::HIGH_BELOW {
			DiversityBand::High
		} else if hhi < Self::MEDIUM_BELOW {
			DiversityBand::Medium
		} else {
			DiversityBand::Low
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationRisk {
	pub dimension: Dimension,
	pub key: String,
	pub node_count: usize,
	pub capacity: u64,
	pub share_ppm: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DimensionIndex {
	pub dimension: Dimension,
	pub hhi: f64,
	pub band: DiversityBand,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationAnalysis {
	pub risks: Vec<ConcentrationRisk>,
	pub indices: Vec<DimensionIndex>,
	/// One minus the mean index over country, provider and operator.
	pub diversity_score: f64,
	pub diversity_band: DiversityBand,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Representation {
	Over,
	Under,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClusterFlag {
	pub key: String,
	pub node_count: usize,
	pub capacity_share: f64,
	pub expected_nodes: f64,
	pub residual: f64,
	pub z_score: f64,
	pub representation: Representation,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClusterFit {
	/// Too few buckets, or no spread in capacity share, to fit a line.
	Insufficient { buckets: usize },
	Fitted { slope: f64, intercept: f64, residual_stddev: f64, flags: Vec<ClusterFlag> },
}

impl ClusterFit {
	pub fn flags(&self) -> &[ClusterFlag] {
		match self {
			ClusterFit::Insufficient { .. } => &[],
			ClusterFit::Fitted { flags, .. } => flags,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerformanceOutlier {
	pub node: NodeId,
	pub operator: OperatorId,
	pub weight_share: f64,
	pub capacity_share: f64,
	pub ratio: f64,
	pub representation: Representation,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerformanceAnalysis {
	pub band: (f64, f64),
	pub evaluated: usize,
	pub outliers: Vec<PerformanceOutlier>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityTier {
	pub label: String,
	/// Inclusive lower bound in bytes per second.
	pub min: u64,
	/// Exclusive upper bound; `None` for the open top tier.
	pub max: Option<u64>,
	pub node_count: usize,
	pub capacity: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntelligenceReport {
	pub concentration: ConcentrationAnalysis,
	pub clustering: BTreeMap<Dimension, ClusterFit>,
	pub performance: PerformanceAnalysis,
	pub capacity_tiers: Vec<CapacityTier>,
}
