use relay_primitives::{Dimension, NodeId, OperatorId, ReliabilityConfig, Window};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Normalized uptime of one window. Too few samples is a result of its own, never zero.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UptimeValue {
	Percentage { value: f64 },
	InsufficientData { samples: usize, required: usize },
}

impl UptimeValue {
	pub fn percentage(&self) -> Option<f64> {
		match self {
			UptimeValue::Percentage { value } => Some(*value),
			UptimeValue::InsufficientData { .. } => None,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeWindowRecord {
	pub uptime: UptimeValue,
	pub sample_count: usize,
	/// Z-score within each dimension cohort that could be evaluated.
	pub cohort_z: BTreeMap<Dimension, f64>,
	/// Beyond the threshold in at least one cohort.
	pub outlier: bool,
	/// Mean of the present bandwidth samples scaled by the series factor.
	pub mean_throughput: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeReliability {
	pub operator: OperatorId,
	pub windows: BTreeMap<Window, NodeWindowRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OperatorWindowScore {
	/// Capacity-weighted mean of the members' computed percentages.
	pub score: Option<f64>,
	pub contributing: usize,
	pub member_count: usize,
	pub eligible: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReliabilityReport {
	pub thresholds: ReliabilityConfig,
	pub nodes: BTreeMap<NodeId, NodeReliability>,
	pub operators: BTreeMap<OperatorId, BTreeMap<Window, OperatorWindowScore>>,
}

impl ReliabilityReport {
	pub fn node_window(&self, node: &NodeId, window: Window) -> Option<&NodeWindowRecord> {
		self.nodes.get(node)?.windows.get(&window)
	}

	pub fn operator_window(&self, operator: &OperatorId, window: Window) -> Option<&OperatorWindowScore> {
		self.operators.get(operator)?.get(&window)
	}

	/// Operators ranked on this window: eligible and carrying a score.
	pub fn eligible(&self, window: Window) -> impl Iterator<Item = (&OperatorId, f64)> + '_ {
		self.operators.iter().filter_map(move |(id, windows)| {
			let score = windows.get(&window)?;
			if score.eligible {
				score.score.map(|value| (id, value))
			} else {
				None
			}
		})
	}

	pub fn outliers(&self, window: Window) -> impl Iterator<Item = (&NodeId, &NodeWindowRecord)> + '_ {
		self.nodes.iter().filter_map(move |(id, node)| {
			node.windows.get(&window).filter(|record| record.outlier).map(|record| (id, record))
		})
	}
}
