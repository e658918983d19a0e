use crate::bundle::{ComputedBundle, Section};
use chrono::{DateTime, Utc};
use client_feeds::{
	CacheError, CacheStore, CoordinatorError, FeedTransport, FetchCoordinator, FetchResultBundle,
	HttpTransport, TransportError,
};
use relay_primitives::{ConfigError, FeedKind, RunConfig};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error(transparent)]
	Cache(#[from] CacheError),
	#[error("failed to build the http transport: {0}")]
	Transport(#[from] TransportError),
	#[error("required feed {feed} failed: {reason}")]
	RequiredFeedFailure { feed: FeedKind, reason: String },
	#[error("failed to write bundle to {path}: {source}")]
	Output {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("failed to encode bundle: {0}")]
	Encode(#[from] serde_json::Error),
	#[error("failed to start the async runtime: {0}")]
	Runtime(#[source] std::io::Error),
}

impl From<CoordinatorError> for RunError {
	fn from(err: CoordinatorError) -> Self {
		match err {
			CoordinatorError::RequiredFeedFailure { feed, reason } => {
				RunError::RequiredFeedFailure { feed, reason }
			},
		}
	}
}

/// One configured run: the validated config, the shared cache and the network seam.
pub struct Pipeline {
	config: RunConfig,
	cache: Arc<CacheStore>,
	transport: Arc<dyn FeedTransport>,
}

impl std::fmt::Debug for Pipeline {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Pipeline")
			.field("config", &self.config)
			.field("cache", &self.cache)
			.finish_non_exhaustive()
	}
}

impl Pipeline {
	pub fn new(
		config: RunConfig,
		cache: Arc<CacheStore>,
		transport: Arc<dyn FeedTransport>,
	) -> Result<Self, RunError> {
		config.validate()?;
		Ok(Self { config, cache, transport })
	}

	/// Opens the cache directory from the config and talks to the feeds over HTTP.
	pub async fn connect(config: RunConfig) -> Result<Self, RunError> {
		config.validate()?;
		let cache = CacheStore::open(config.cache_dir.clone()).await?;
		let transport = HttpTransport::new()?;
		Self::new(config, Arc::new(cache), Arc::new(transport))
	}

	pub fn config(&self) -> &RunConfig {
		&self.config
	}

	pub async fn run(&self) -> Result<ComputedBundle, RunError> {
		let coordinator = FetchCoordinator::new(&self.config, self.cache.clone(), self.transport.clone());
		let fetched = coordinator.run(&self.config.feed_set()).await?;
		Ok(compute(&fetched, &self.config, Utc::now()))
	}
}

/// Connects and runs the pipeline once.
pub async fn run_once(config: RunConfig) -> Result<ComputedBundle, RunError> {
	let pipeline = Pipeline::connect(config).await?;
	pipeline.run().await
}

/// Runs every engine over a settled fetch. Pure: the same input always yields the same bundle
/// apart from `generated_at`.
pub fn compute(fetched: &FetchResultBundle, config: &RunConfig, generated_at: DateTime<Utc>) -> ComputedBundle {
	let (nodes, operators, reconcile) = engine_reconciler::reconcile(fetched);
	let statistics = engine_statistics::compute(&nodes, config);
	let intelligence = engine_intelligence::analyze(&nodes, &statistics, config);
	let report = engine_reliability::score(&nodes, &operators, &config.reliability);

	let degraded: BTreeSet<FeedKind> = fetched.degraded.iter().map(|d| d.feed).collect();
	let leaderboards = engine_leaderboard::rank(&operators, &report, &degraded, config);

	let reliability = match fetched.degraded.iter().find(|d| d.feed == FeedKind::Uptime) {
		Some(capability) => {
			log::warn!("⚠️ Reliability section unavailable: {}", capability.reason);
			Section::Unavailable { reason: format!("{} feed is degraded: {}", capability.feed, capability.reason) }
		},
		None => Section::Available(report),
	};

	log::info!(
		"✅ Computed bundle: {} nodes, {} operators, {} degraded capabilities",
		nodes.len(),
		operators.len(),
		fetched.degraded.len()
	);

	ComputedBundle {
		generated_at,
		nodes,
		operators,
		statistics,
		intelligence,
		reliability,
		leaderboards,
		feeds: fetched.summaries.clone(),
		degraded: fetched.degraded.clone(),
		reconcile,
	}
}
