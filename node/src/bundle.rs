use crate::pipeline::RunError;
use chrono::{DateTime, Utc};
use client_feeds::{DegradedCapability, FeedSummary};
use engine_intelligence::IntelligenceReport;
use engine_leaderboard::Leaderboards;
use engine_reconciler::ReconcileReport;
use engine_reliability::ReliabilityReport;
use engine_statistics::NetworkStatistics;
use relay_primitives::{NodeSet, OperatorSet};
use serde::{Deserialize, Serialize};

/// A bundle section that may be missing because its source feed degraded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Section<T> {
	Available(T),
	Unavailable { reason: String },
}

impl<T> Section<T> {
	pub fn available(&self) -> Option<&T> {
		match self {
			Section::Available(value) => Some(value),
			Section::Unavailable { .. } => None,
		}
	}

	pub fn is_available(&self) -> bool {
		matches!(self, Section::Available(_))
	}
}

/// Everything one run computed, handed to the presentation layer as a single document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComputedBundle {
	pub generated_at: DateTime<Utc>,
	pub nodes: NodeSet,
	pub operators: OperatorSet,
	pub statistics: NetworkStatistics,
	pub intelligence: IntelligenceReport,
	pub reliability: Section<ReliabilityReport>,
	pub leaderboards: Leaderboards,
	pub feeds: Vec<FeedSummary>,
	pub degraded: Vec<DegradedCapability>,
	pub reconcile: ReconcileReport,
}

impl ComputedBundle {
	pub fn signal(&self) -> RunSignal {
		if self.degraded.is_empty() {
			RunSignal::Success
		} else {
			RunSignal::Degraded { capabilities: self.degraded.clone() }
		}
	}
}

/// How a run ended. Exactly one signal is produced per run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RunSignal {
	Success,
	Degraded { capabilities: Vec<DegradedCapability> },
	Fatal { reason: String },
}

impl RunSignal {
	pub fn from_result(result: &Result<ComputedBundle, RunError>) -> Self {
		match result {
			Ok(bundle) => bundle.signal(),
			Err(err) => RunSignal::Fatal { reason: err.to_string() },
		}
	}

	/// Process exit status: 0 success, 2 degraded, 1 fatal.
	pub fn exit_code(&self) -> u8 {
		match self {
			RunSignal::Success => 0,
			RunSignal::Degraded { .. } => 2,
			RunSignal::Fatal { .. } => 1,
		}
	}
}
