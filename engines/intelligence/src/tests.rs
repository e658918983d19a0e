use crate::mock::*;
use crate::*;
use assert_matches::assert_matches;
use relay_primitives::{Dimension, NodeId, RunConfig};

#[test]
fn diversity_bands_use_fixed_cut_points() {
	assert_eq!(DiversityBand::from_hhi(0.0), DiversityBand::High);
	assert_eq!(DiversityBand::from_hhi(0.1499), DiversityBand::High);
	assert_eq!(DiversityBand::from_hhi(0.15), DiversityBand::Medium);
	assert_eq!(DiversityBand::from_hhi(0.2499), DiversityBand::Medium);
	assert_eq!(DiversityBand::from_hhi(0.25), DiversityBand::Low);
	assert_eq!(DiversityBand::from_hhi(1.0), DiversityBand::Low);
}

#[test]
fn concentration_lists_flagged_buckets_largest_first() {
	let nodes = node_set(vec![
		node("A", (60, 60, 60), "de", "AS1"),
		node("B", (30, 30, 30), "fr", "AS2"),
		node("C", (6, 6, 6), "us", "AS3"),
		node("D", (4, 4, 4), "nl", "AS4"),
	]);
	let analysis = concentration(&stats(&nodes));

	// Every fixture node lacks a platform, so that bucket holds everything.
	assert_eq!(analysis.risks[0].dimension, Dimension::Platform);
	assert_eq!(analysis.risks[0].share_ppm, 1_000_000);
	let de = analysis.risks.iter().find(|r| r.key == "de").unwrap();
	assert_eq!(de.share_ppm, 600_000);
	assert_eq!(analysis.risks.iter().filter(|r| r.dimension == Dimension::Country).count(), 3);
	assert!(analysis.risks.iter().all(|r| r.key != "nl" && r.key != "AS4"));
	assert!(analysis.risks.windows(2).all(|w| w[0].share_ppm >= w[1].share_ppm));
	assert_eq!(analysis.indices.len(), 4);
}

#[test]
fn diversity_score_averages_three_dimensions() {
	// One provider; four equal countries, and one declared operator per country.
	let nodes = node_set(vec![
		node("A", (10, 10, 10), "de", "AS1"),
		node("B", (10, 10, 10), "fr", "AS1"),
		node("C", (10, 10, 10), "us", "AS1"),
		node("D", (10, 10, 10), "nl", "AS1"),
	]);
	let analysis = concentration(&stats(&nodes));

	let expected_mean = (0.25 + 1.0 + 0.25) / 3.0;
	assert!((analysis.diversity_score - (1.0 - expected_mean)).abs() < 1e-9);
	assert_eq!(analysis.diversity_band, DiversityBand::Low);
	let country = analysis.indices.iter().find(|i| i.dimension == Dimension::Country).unwrap();
	assert_eq!(country.band, DiversityBand::Low);
}

#[test]
fn clustering_flags_overrepresented_country() {
	let nodes = clustered_network();
	let statistics = stats(&nodes);
	let fit = fit_clusters(statistics.distribution(Dimension::Country).unwrap(), 2.0);

	assert_matches!(fit, ClusterFit::Fitted { slope, .. } if slope > 0.0);
	let flags = fit.flags();
	assert_eq!(flags.len(), 1);
	assert_eq!(flags[0].key, "zz");
	assert_eq!(flags[0].node_count, 30);
	assert_eq!(flags[0].representation, Representation::Over);
	assert!(flags[0].z_score > 2.0);

	let strict = fit_clusters(statistics.distribution(Dimension::Country).unwrap(), 3.0);
	assert!(strict.flags().is_empty());
}

#[test]
fn clustering_needs_three_buckets_with_spread() {
	let two = node_set(vec![node("A", (10, 10, 10), "de", "AS1"), node("B", (20, 20, 20), "fr", "AS1")]);
	let statistics = stats(&two);
	assert_eq!(
		fit_clusters(statistics.distribution(Dimension::Country).unwrap(), 2.0),
		ClusterFit::Insufficient { buckets: 2 }
	);

	let flat = node_set(vec![
		node("A", (10, 10, 10), "de", "AS1"),
		node("B", (10, 10, 10), "fr", "AS1"),
		node("C", (10, 10, 10), "us", "AS1"),
	]);
	let statistics = stats(&flat);
	assert_eq!(
		fit_clusters(statistics.distribution(Dimension::Country).unwrap(), 2.0),
		ClusterFit::Insufficient { buckets: 3 }
	);
}

#[test]
fn unknown_location_is_left_out_of_the_fit() {
	let mut nodes = vec![
		node("A", (10, 10, 10), "de", "AS1"),
		node("B", (20, 20, 20), "fr", "AS1"),
	];
	let mut lost = node("C", (30, 30, 30), "", "AS1");
	lost.location.country = None;
	nodes.push(lost);
	let statistics = stats(&node_set(nodes));

	assert_eq!(
		fit_clusters(statistics.distribution(Dimension::Country).unwrap(), 2.0),
		ClusterFit::Insufficient { buckets: 2 }
	);
}

#[test]
fn performance_flags_both_directions() {
	let nodes = node_set(vec![
		node("A", (100, 100, 100), "de", "AS1"),
		node("B", (100, 100, 100), "fr", "AS2"),
		node("C", (10, 10, 1_000), "us", "AS3"),
		node("Z", (0, 100, 100), "us", "AS3"),
	]);
	let analysis = performance(&nodes, &stats(&nodes));

	assert_eq!(analysis.evaluated, 3);
	assert_eq!(analysis.outliers.len(), 3);
	let c = analysis.outliers.iter().find(|o| o.node == NodeId::new("C")).unwrap();
	assert_eq!(c.representation, Representation::Over);
	assert!(c.ratio > PERFORMANCE_BAND.1);
	let a = analysis.outliers.iter().find(|o| o.node == NodeId::new("A")).unwrap();
	assert_eq!(a.representation, Representation::Under);
	assert!(analysis.outliers.iter().all(|o| o.node != NodeId::new("Z")));
}

#[test]
fn balanced_network_has_no_performance_outliers() {
	let nodes = node_set(vec![
		node("A", (100, 90, 80), "de", "AS1"),
		node("B", (50, 60, 55), "de", "AS1"),
		node("C", (200, 200, 200), "us", "AS2"),
	]);
	let analysis = performance(&nodes, &stats(&nodes));

	assert_eq!(analysis.evaluated, 3);
	assert!(analysis.outliers.is_empty());
}

#[test]
fn capacity_tiers_split_at_fixed_bounds() {
	let sorted: [u64; 7] = [500_000, 1_000_000, 9_999_999, 10_000_000, 75_000_000, 100_000_000, 250_000_000];
	let tiers = capacity_tiers(&sorted);

	let counts: Vec<usize> = tiers.iter().map(|t| t.node_count).collect();
	assert_eq!(counts, vec![1, 2, 1, 1, 2]);
	assert_eq!(tiers[1].capacity, 10_999_999);
	assert_eq!(tiers[4].max, None);
	assert_eq!(tiers[0].label, "< 1 MB/s");
	assert!(capacity_tiers(&[]).iter().all(|t| t.node_count == 0));
}

#[test]
fn analyze_fits_country_and_provider_only() {
	let nodes = clustered_network();
	let statistics = stats(&nodes);
	let report = analyze(&nodes, &statistics, &RunConfig::default());

	assert_eq!(report.clustering.len(), 2);
	assert_eq!(report.clustering[&Dimension::Country].flags().len(), 1);
	assert_eq!(report.clustering[&Dimension::Provider], ClusterFit::Insufficient { buckets: 1 });
	assert_eq!(report.capacity_tiers.iter().map(|t| t.node_count).sum::<usize>(), nodes.len());
}
