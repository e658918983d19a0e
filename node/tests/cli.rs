use clap::Parser;
use relay_primitives::FeedKind;
use relaywatch::cli::Cli;
use std::io::Write;

#[test]
fn defaults_without_arguments() {
	let cli = Cli::try_parse_from(["relaywatch"]).expect("parses");
	let config = cli.run_config().expect("default config is valid");

	assert_eq!(cli.log_level, log::LevelFilter::Info);
	assert!(cli.output.is_none());
	assert_eq!(config.reliability.min_samples, 30);
	assert_eq!(config.reliability.min_operator_size, 25);
	assert_eq!(config.feeds.len(), FeedKind::ALL.len());
}

#[test]
fn flags_override_the_config() {
	let cli = Cli::try_parse_from([
		"relaywatch",
		"--workers",
		"2",
		"--details-url",
		"http://mirror.test/details",
		"--min-operator-size",
		"3",
		"--concentration-threshold",
		"0.1",
		"--no-stale-fallback",
		"--log-level",
		"debug",
	])
	.expect("parses");
	let config = cli.run_config().expect("valid");

	assert_eq!(config.worker_pool_size, 2);
	assert_eq!(config.feeds[&FeedKind::Details].url, "http://mirror.test/details");
	assert_eq!(config.reliability.min_operator_size, 3);
	assert_eq!(config.concentration_threshold_ppm(), 100_000);
	assert!(!config.allow_stale_fallback);
	assert_eq!(cli.log_level, log::LevelFilter::Debug);
}

#[test]
fn config_file_is_layered_under_flags() {
	let mut file = tempfile::NamedTempFile::new().expect("tempfile");
	write!(file, r#"{{ "worker_pool_size": 8, "leaderboard_size": 10 }}"#).expect("write");
	let path = file.path().to_str().expect("utf8 path").to_string();

	let cli = Cli::try_parse_from(["relaywatch", "--config", &path, "--workers", "3"]).expect("parses");
	let config = cli.run_config().expect("valid");

	assert_eq!(config.worker_pool_size, 3);
	assert_eq!(config.leaderboard_size, 10);
}

#[test]
fn impossible_values_are_rejected() {
	let cli = Cli::try_parse_from(["relaywatch", "--concentration-threshold", "1.5"]).expect("parses");
	assert!(cli.run_config().is_err());
}
