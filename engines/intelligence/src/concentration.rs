use crate::types::{ConcentrationAnalysis, ConcentrationRisk, DimensionIndex, DiversityBand};
use engine_statistics::NetworkStatistics;
use relay_primitives::Dimension;

/// Dimensions averaged into the network diversity score.
const DIVERSITY_DIMENSIONS: [Dimension; 3] = [Dimension::Country, Dimension::Provider, Dimension::Operator];

pub fn concentration(stats: &NetworkStatistics) -> ConcentrationAnalysis {
	let mut risks = Vec::new();
	let mut indices = Vec::new();

	for (dimension, distribution) in &stats.distributions {
		risks.extend(distribution.flagged().map(|bucket| ConcentrationRisk {
			dimension: *dimension,
			key: bucket.key.clone(),
			node_count: bucket.node_count,
			capacity: bucket.capacity,
			share_ppm: bucket.share_ppm,
		}));
		indices.push(DimensionIndex {
			dimension: *dimension,
			hhi: distribution.hhi,
			band: DiversityBand::from_hhi(distribution.hhi),
		});
	}

	// Largest share first; dimension then key keep equal shares in a fixed order.
	risks.sort_by(|a, b| {
		b.share_ppm
			.cmp(&a.share_ppm)
			.then_with(|| a.dimension.cmp(&b.dimension))
			.then_with(|| a.key.cmp(&b.key))
	});

	let mean_hhi = DIVERSITY_DIMENSIONS.iter().map(|d| stats.hhi(*d)).sum::<f64>()
		/ DIVERSITY_DIMENSIONS.len() as f64;

	ConcentrationAnalysis {
		risks,
		indices,
		diversity_score: 1.0 - mean_hhi,
		diversity_band: DiversityBand::from_hhi(mean_hhi),
	}
}
