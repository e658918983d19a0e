//! # Intelligence Engine
//!
//! Derives risk intelligence from the shared [`NetworkStatistics`] snapshot:
//!
//! - concentration risk and a banded network diversity score,
//! - geographic clustering against the count-vs-capacity regression,
//! - per-node performance outliers (weight share against capacity share),
//! - the capacity tier histogram.
//!
//! Every analysis is a pure function of its inputs and never modifies a node or operator.

use engine_statistics::NetworkStatistics;
use relay_primitives::{Dimension, NodeSet, RunConfig};

mod clustering;
mod concentration;
mod performance;
mod tiers;
mod types;

pub use clustering::fit_clusters;
pub use concentration::concentration;
pub use performance::{performance, PERFORMANCE_BAND};
pub use tiers::{capacity_tiers, TIER_BOUNDS};
pub use types::{
	CapacityTier, ClusterFit, ClusterFlag, ConcentrationAnalysis, ConcentrationRisk, DimensionIndex,
	DiversityBand, IntelligenceReport, PerformanceAnalysis, PerformanceOutlier, Representation,
};

#[cfg(test)]
mod mock;

#[cfg(test)]
mod tests;

pub fn analyze(nodes: &NodeSet, stats: &NetworkStatistics, config: &RunConfig) -> IntelligenceReport {
	let concentration = concentration(stats);
	let clustering = [Dimension::Country, Dimension::Provider]
		.into_iter()
		.filter_map(|dimension| {
			let distribution = stats.distribution(dimension)?;
			Some((dimension, fit_clusters(distribution, config.clustering_sigma)))
		})
		.collect();
	let performance = performance(nodes, stats);
	let capacity_tiers = capacity_tiers(&stats.sorted_capacities);

	log::info!(
		"✅ Intelligence: {} concentration risks, diversity {:.3} ({:?}), {} performance outliers",
		concentration.risks.len(),
		concentration.diversity_score,
		concentration.diversity_band,
		performance.outliers.len()
	);

	IntelligenceReport { concentration, clustering, performance, capacity_tiers }
}
