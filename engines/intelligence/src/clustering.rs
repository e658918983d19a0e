use crate::types::{ClusterFit, ClusterFlag, Representation};
use engine_statistics::Distribution;
use relay_primitives::node::UNKNOWN_BUCKET;

const MIN_BUCKETS: usize = 3;

/// Fits node count against capacity share across the buckets of one dimension and flags the
/// buckets whose residual exceeds `sigma` standard deviations of all residuals.
///
/// Nodes without a known location are left out of the fit.
pub fn fit_clusters(distribution: &Distribution, sigma: f64) -> ClusterFit {
	let points: Vec<(&str, usize, f64)> = distribution
		.buckets
		.iter()
		.filter(|b| b.key != UNKNOWN_BUCKET)
		.map(|b| (b.key.as_str(), b.node_count, b.share()))
		.collect();

	let n = points.len() as f64;
	let no_spread = points.iter().all(|(_, _, x)| *x == points[0].2);
	if points.len() < MIN_BUCKETS || no_spread {
		return ClusterFit::Insufficient { buckets: points.len() };
	}

	let mean_x = points.iter().map(|(_, _, x)| x).sum::<f64>() / n;
	let mean_y = points.iter().map(|(_, y, _)| *y as f64).sum::<f64>() / n;
	let (mut sxx, mut sxy) = (0.0, 0.0);
	for (_, y, x) in &points {
		sxx += (x - mean_x) * (x - mean_x);
		sxy += (x - mean_x) * (*y as f64 - mean_y);
	}
	if sxx == 0.0 {
		return ClusterFit::Insufficient { buckets: points.len() };
	}

	let slope = sxy / sxx;
	let intercept = mean_y - slope * mean_x;
	let residuals: Vec<f64> =
		points.iter().map(|(_, y, x)| *y as f64 - (intercept + slope * x)).collect();
	let residual_stddev = (residuals.iter().map(|r| r * r).sum::<f64>() / n).sqrt();

	let mut flags = Vec::new();
	if residual_stddev > 0.0 {
		for ((key, node_count, share), residual) in points.iter().zip(&residuals) {
			let z_score = residual / residual_stddev;
			if z_score.abs() <= sigma {
				continue;
			}
			flags.push(ClusterFlag {
				key: key.to_string(),
				node_count: *node_count,
				capacity_share: *share,
				expected_nodes: intercept + slope * share,
				residual: *residual,
				z_score,
				representation: if *residual > 0.0 {
					Representation::Over
				} else {
					Representation::Under
				},
			});
		}
	}

	if !flags.is_empty() {
		log::info!("⚠️ {} {} buckets deviate from the capacity regression", flags.len(), distribution.dimension);
	}

	ClusterFit::Fitted { slope, intercept, residual_stddev, flags }
}
