use assert_matches::assert_matches;
use client_feeds::mock::*;
use client_feeds::{CacheStore, FetchOutcome};
use engine_leaderboard::{BoardStatus, Category};
use relay_primitives::{FeedKind, OperatorId, Window};
use relaywatch::command::write_bundle;
use relaywatch::{ComputedBundle, Pipeline, RunError, RunSignal, Section};
use std::sync::Arc;
use tempfile::TempDir;

fn serve_network(transport: &ScriptedTransport) {
	let mut flaky = vec![Some(999); 20];
	flaky.extend(vec![Some(0); 20]);

	transport
		.serve(
			DETAILS_URL,
			details_body(vec![
				relay("AAAA", Some("x"), (100, 90, 80), "de", "AS1"),
				relay("BBBB", Some("x"), (50, 60, 55), "fr", "AS2"),
				relay("CCCC", Some("y"), (200, 200, 200), "us", "AS3"),
			]),
		)
		.serve(UPTIME_URL, uptime_body(&[("AAAA", "6_months", vec![Some(999); 40]), ("BBBB", "6_months", flaky)]))
		.serve(BANDWIDTH_URL, bandwidth_body(&[("AAAA", "1_month", vec![Some(500); 6])]))
		.serve(VALIDATION_URL, validation_body(&[("AAAA", true), ("BBBB", false)]))
		.serve(CONSENSUS_URL, consensus_body(&[("AAAA", 9), ("BBBB", 9), ("CCCC", 8)]));
}

async fn pipeline(dir: &TempDir, transport: &Arc<ScriptedTransport>) -> Pipeline {
	let mut config = test_config();
	config.cache_dir = dir.path().to_path_buf();
	let cache = Arc::new(CacheStore::open(dir.path()).await.expect("cache dir"));
	Pipeline::new(config, cache, transport.clone()).expect("valid config")
}

fn signal(result: &Result<ComputedBundle, RunError>) -> RunSignal {
	RunSignal::from_result(result)
}

#[tokio::test]
async fn end_to_end_scenario() {
	let dir = TempDir::new().expect("tempdir");
	let transport = Arc::new(ScriptedTransport::new());
	serve_network(&transport);

	let result = pipeline(&dir, &transport).await.run().await;
	assert_eq!(signal(&result), RunSignal::Success);
	assert_eq!(signal(&result).exit_code(), 0);
	let bundle = result.expect("bundle");

	assert_eq!(bundle.nodes.len(), 3);
	assert_eq!(bundle.operators.len(), 2);
	assert_eq!(bundle.statistics.totals.effective_capacity, 330);
	assert!(bundle.intelligence.performance.outliers.is_empty());
	assert_eq!(bundle.intelligence.performance.evaluated, 3);

	let reliability = bundle.reliability.available().expect("uptime was served");
	let x = reliability.operator_window(&OperatorId::declared("x"), Window::SixMonths).expect("scored");
	assert_eq!(x.contributing, 2);
	assert!(!x.eligible);
	let expected = (80.0 * 100.0 + 50.0 * 50.0) / 130.0;
	assert!((x.score.expect("score") - expected).abs() < 1e-9);

	let capacity = bundle.leaderboards.entries(Category::CapacityContributed);
	let ranked: Vec<_> = capacity.iter().map(|e| (e.operator.as_str(), e.rank, e.score)).collect();
	assert_eq!(ranked, vec![("contact:y", 1, 200.0), ("contact:x", 2, 130.0)]);
	assert_eq!(
		bundle.leaderboards.board(Category::ReliabilitySixMonths).map(|b| b.status.clone()),
		Some(BoardStatus::InsufficientData)
	);
	let validated: Vec<_> = bundle
		.leaderboards
		.entries(Category::ValidationCompliance)
		.iter()
		.map(|e| e.operator.as_str())
		.collect();
	assert_eq!(validated, vec!["contact:x"]);
}

#[tokio::test]
async fn second_run_within_ttl_is_offline_and_identical() {
	let dir = TempDir::new().expect("tempdir");
	let transport = Arc::new(ScriptedTransport::new());
	serve_network(&transport);
	let pipeline = pipeline(&dir, &transport).await;

	let first = pipeline.run().await.expect("first run");
	let calls = transport.total_calls();
	assert_eq!(calls, FeedKind::ALL.len());

	let second = pipeline.run().await.expect("second run");
	assert_eq!(transport.total_calls(), calls);
	assert!(second.feeds.iter().all(|summary| summary.outcome == FetchOutcome::Cached));

	similar_asserts::assert_eq!(first.nodes, second.nodes);
	similar_asserts::assert_eq!(first.operators, second.operators);
	similar_asserts::assert_eq!(first.statistics, second.statistics);
	similar_asserts::assert_eq!(first.intelligence, second.intelligence);
	similar_asserts::assert_eq!(first.reliability, second.reliability);
	similar_asserts::assert_eq!(first.leaderboards, second.leaderboards);
}

#[tokio::test]
async fn missing_uptime_degrades_only_reliability() {
	let healthy_dir = TempDir::new().expect("tempdir");
	let healthy_transport = Arc::new(ScriptedTransport::new());
	serve_network(&healthy_transport);
	let healthy = pipeline(&healthy_dir, &healthy_transport).await.run().await.expect("healthy run");

	let dir = TempDir::new().expect("tempdir");
	let transport = Arc::new(ScriptedTransport::new());
	serve_network(&transport);
	transport.take_down(UPTIME_URL);

	let result = pipeline(&dir, &transport).await.run().await;
	assert_matches!(signal(&result), RunSignal::Degraded { ref capabilities } if capabilities.len() == 1);
	assert_eq!(signal(&result).exit_code(), 2);
	let bundle = result.expect("degraded run still produces a bundle");

	assert_eq!(bundle.degraded[0].feed, FeedKind::Uptime);
	assert_matches!(bundle.reliability, Section::Unavailable { .. });
	for category in [Category::ReliabilitySixMonths, Category::ReliabilityFiveYears] {
		assert_eq!(bundle.leaderboards.board(category).map(|b| b.status.clone()), Some(BoardStatus::InsufficientData));
	}
	for category in [Category::CapacityContributed, Category::ValidationCompliance, Category::FleetSize] {
		similar_asserts::assert_eq!(healthy.leaderboards.board(category), bundle.leaderboards.board(category));
	}
}

#[tokio::test]
async fn details_failure_is_fatal() {
	let dir = TempDir::new().expect("tempdir");
	let transport = Arc::new(ScriptedTransport::new());
	serve_network(&transport);
	transport.take_down(DETAILS_URL);

	let result = pipeline(&dir, &transport).await.run().await;

	assert_matches!(result, Err(RunError::RequiredFeedFailure { feed: FeedKind::Details, .. }));
	assert_matches!(signal(&result), RunSignal::Fatal { .. });
	assert_eq!(signal(&result).exit_code(), 1);
}

#[tokio::test]
async fn invalid_config_is_rejected_before_fetching() {
	let dir = TempDir::new().expect("tempdir");
	let transport = Arc::new(ScriptedTransport::new());
	let mut config = test_config();
	config.worker_pool_size = 0;
	let cache = Arc::new(CacheStore::open(dir.path()).await.expect("cache dir"));

	let result = Pipeline::new(config, cache, transport.clone());

	assert_matches!(result, Err(RunError::Config(_)));
	assert_eq!(transport.total_calls(), 0);
}

#[tokio::test]
async fn bundle_is_written_as_json() {
	let dir = TempDir::new().expect("tempdir");
	let transport = Arc::new(ScriptedTransport::new());
	serve_network(&transport);
	transport.take_down(UPTIME_URL);
	let bundle = pipeline(&dir, &transport).await.run().await.expect("bundle");

	let path = dir.path().join("bundle.json");
	write_bundle(&bundle, Some(&path)).expect("write");

	let written: serde_json::Value =
		serde_json::from_slice(&std::fs::read(&path).expect("read back")).expect("valid json");
	assert_eq!(written["reliability"]["status"], "unavailable");
	assert_eq!(written["degraded"][0]["feed"], "uptime");
	assert_eq!(written["leaderboards"]["boards"]["capacity_contributed"]["status"]["status"], "ranked");
	assert_eq!(written["statistics"]["totals"]["effective_capacity"], 330);
}
