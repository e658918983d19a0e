use relay_primitives::{ConfigError, FeedKind, RunConfig};
use std::path::PathBuf;

#[derive(Debug, clap::Parser)]
#[command(name = "relaywatch", version, about = "Fetches the relay telemetry feeds and computes the network bundle")]
pub struct Cli {
	/// JSON configuration file. Every field is optional and defaults apply to the rest.
	#[arg(long, short = 'c')]
	pub config: Option<PathBuf>,

	#[arg(long, help = "Directory holding the per-feed cache entries")]
	pub cache_dir: Option<PathBuf>,

	/// Where to write the computed bundle (stdout when omitted).
	#[arg(long, short = 'o')]
	pub output: Option<PathBuf>,

	#[arg(long, help = "Number of feeds fetched concurrently")]
	pub workers: Option<usize>,

	#[arg(long, help = "Override the node details feed url")]
	pub details_url: Option<String>,

	#[arg(long, help = "Override the uptime history feed url")]
	pub uptime_url: Option<String>,

	#[arg(long, help = "Override the bandwidth history feed url")]
	pub bandwidth_url: Option<String>,

	#[arg(long, help = "Override the operator validation feed url")]
	pub validation_url: Option<String>,

	#[arg(long, help = "Override the consensus feed url")]
	pub consensus_url: Option<String>,

	/// Fail optional feeds instead of serving expired cache entries.
	#[arg(long)]
	pub no_stale_fallback: bool,

	#[arg(long, help = "Minimum present samples before a window gets an uptime percentage (e.g. 30)")]
	pub min_samples: Option<usize>,

	#[arg(long, help = "Minimum scored members before an operator is ranked on reliability (e.g. 25)")]
	pub min_operator_size: Option<usize>,

	#[arg(long, help = "Share of total capacity that marks a concentration risk (e.g. 0.05)")]
	pub concentration_threshold: Option<f64>,

	/// Log level; `RUST_LOG` overrides it per module.
	#[arg(long, default_value = "info")]
	pub log_level: log::LevelFilter,
}

impl Cli {
	/// Loads the config file, if any, and applies the command line overrides on top.
	pub fn run_config(&self) -> Result<RunConfig, ConfigError> {
		let mut config = match &self.config {
			Some(path) => RunConfig::from_file(path)?,
			None => RunConfig::default(),
		};

		if let Some(dir) = &self.cache_dir {
			config.cache_dir = dir.clone();
		}
		if let Some(workers) = self.workers {
			config.worker_pool_size = workers;
		}
		if self.no_stale_fallback {
			config.allow_stale_fallback = false;
		}
		if let Some(min_samples) = self.min_samples {
			config.reliability.min_samples = min_samples;
		}
		if let Some(min_operator_size) = self.min_operator_size {
			config.reliability.min_operator_size = min_operator_size;
		}
		if let Some(threshold) = self.concentration_threshold {
			config.concentration_threshold = threshold;
		}

		let urls = [
			(FeedKind::Details, &self.details_url),
			(FeedKind::Uptime, &self.uptime_url),
			(FeedKind::Bandwidth, &self.bandwidth_url),
			(FeedKind::Validation, &self.validation_url),
			(FeedKind::Consensus, &self.consensus_url),
		];
		for (kind, url) in urls {
			if let Some(url) = url {
				config.feeds.entry(kind).or_insert_with(|| kind.default_config()).url = url.clone();
			}
		}

		config.validate()?;
		Ok(config)
	}
}
