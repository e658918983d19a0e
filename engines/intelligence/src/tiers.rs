use crate::types::CapacityTier;

const MB: u64 = 1_000_000;

/// Lower bounds of the capacity tiers in bytes per second; each tier ends where the next begins.
pub const TIER_BOUNDS: [(u64, &str); 5] = [
	(0, "< 1 MB/s"),
	(MB, "1-10 MB/s"),
	(10 * MB, "10-50 MB/s"),
	(50 * MB, "50-100 MB/s"),
	(100 * MB, ">= 100 MB/s"),
];

/// Buckets an ascending capacity vector into the fixed tiers by binary search.
pub fn capacity_tiers(sorted: &[u64]) -> Vec<CapacityTier> {
	TIER_BOUNDS
		.iter()
		.enumerate()
		.map(|(index, (min, label))| {
			let max = TIER_BOUNDS.get(index + 1).map(|(next, _)| *next);
			let start = sorted.partition_point(|c| c < min);
			let end = match max {
				Some(max) => sorted.partition_point(|c| *c < max),
				None => sorted.len(),
			};
			let slice = &sorted[start..end];
			CapacityTier {
				label: label.to_string(),
				min: *min,
				max,
				node_count: slice.len(),
				capacity: slice.iter().fold(0u64, |acc, c| acc.saturating_add(*c)),
			}
		})
		.collect()
}
