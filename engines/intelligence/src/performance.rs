use crate::types::{PerformanceAnalysis, PerformanceOutlier, Representation};
use engine_statistics::NetworkStatistics;
use relay_primitives::NodeSet;

/// Accepted range of weight share over capacity share, inclusive at both ends.
pub const PERFORMANCE_BAND: (f64, f64) = (0.5, 2.0);

pub fn performance(nodes: &NodeSet, stats: &NetworkStatistics) -> PerformanceAnalysis {
	let total_capacity = stats.totals.effective_capacity;
	let total_weight = stats.totals.weight;
	let (low, high) = PERFORMANCE_BAND;
	let mut evaluated = 0;
	let mut outliers = Vec::new();

	if total_capacity == 0 || total_weight == 0 {
		return PerformanceAnalysis { band: PERFORMANCE_BAND, evaluated, outliers };
	}

	for node in nodes.values() {
		let capacity = node.effective_capacity();
		if capacity == 0 {
			continue;
		}
		evaluated += 1;

		let capacity_share = capacity as f64 / total_capacity as f64;
		let weight_share = node.weight as f64 / total_weight as f64;
		let ratio = weight_share / capacity_share;
		let representation = if ratio < low {
			Representation::Under
		} else if ratio > high {
			Representation::Over
		} else {
			continue;
		};

		outliers.push(PerformanceOutlier {
			node: node.id.clone(),
			operator: node.operator_id(),
			weight_share,
			capacity_share,
			ratio,
			representation,
		});
	}

	PerformanceAnalysis { band: PERFORMANCE_BAND, evaluated, outliers }
}
