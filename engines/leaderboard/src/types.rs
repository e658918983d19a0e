use core::fmt;
use relay_primitives::{FeedKind, Operator, OperatorId, Window};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
	CapacityContributed,
	ConsensusWeight,
	ExitCapacity,
	GuardCapacity,
	ReliabilitySixMonths,
	ReliabilityFiveYears,
	CountryDiversity,
	ProviderDiversity,
	ValidationCompliance,
	FleetSize,
}

impl Category {
	pub const ALL: [Category; 10] = [
		Category::CapacityContributed,
		Category::ConsensusWeight,
		Category::ExitCapacity,
		Category::GuardCapacity,
		Category::ReliabilitySixMonths,
		Category::ReliabilityFiveYears,
		Category::CountryDiversity,
		Category::ProviderDiversity,
		Category::ValidationCompliance,
		Category::FleetSize,
	];

	pub fn as_str(&self) -> &'static str {
		match self {
			Category::CapacityContributed => "capacity_contributed",
			Category::ConsensusWeight => "consensus_weight",
			Category::ExitCapacity => "exit_capacity",
			Category::GuardCapacity => "guard_capacity",
			Category::ReliabilitySixMonths => "reliability_six_months",
			Category::ReliabilityFiveYears => "reliability_five_years",
			Category::CountryDiversity => "country_diversity",
			Category::ProviderDiversity => "provider_diversity",
			Category::ValidationCompliance => "validation_compliance",
			Category::FleetSize => "fleet_size",
		}
	}

	/// The optional feed a board cannot be built without.
	///
	/// Reliability boards have none: without uptime data no operator passes the eligibility
	/// gates, and the board reports insufficient data on its own.
	pub fn source_feed(&self) -> Option<FeedKind> {
		match self {
			Category::ValidationCompliance => Some(FeedKind::Validation),
			_ => None,
		}
	}

	pub fn reliability_window(&self) -> Option<Window> {
		match self {
			Category::ReliabilitySixMonths => Some(Window::SixMonths),
			Category::ReliabilityFiveYears => Some(Window::FiveYears),
			_ => None,
		}
	}

	/// Score of an operator in a category read straight from its derived totals.
	pub fn total_score(&self, operator: &Operator) -> Option<f64> {
		let totals = &operator.totals;
		let score = match self {
			Category::CapacityContributed => totals.effective_capacity as f64,
			Category::ConsensusWeight => totals.weight as f64,
			Category::ExitCapacity => totals.exit_capacity as f64,
			Category::GuardCapacity => totals.guard_capacity as f64,
			Category::CountryDiversity => totals.countries.len() as f64,
			Category::ProviderDiversity => totals.providers.len() as f64,
			Category::ValidationCompliance => totals.validated_count as f64,
			Category::FleetSize => totals.node_count as f64,
			Category::ReliabilitySixMonths | Category::ReliabilityFiveYears => return None,
		};
		Some(score)
	}
}

impl fmt::Display for Category {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
	pub operator: OperatorId,
	pub label: String,
	pub category: Category,
	pub rank: u32,
	pub score: f64,
	pub tie_break: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BoardStatus {
	Ranked,
	/// No operator passed the eligibility gates.
	InsufficientData,
	/// The feed the category depends on is degraded for this run.
	Unavailable { reason: String },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
	pub category: Category,
	pub status: BoardStatus,
	pub entries: Vec<LeaderboardEntry>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Leaderboards {
	pub boards: BTreeMap<Category, Leaderboard>,
}

impl Leaderboards {
	pub fn board(&self, category: Category) -> Option<&Leaderboard> {
		self.boards.get(&category)
	}

	pub fn entries(&self, category: Category) -> &[LeaderboardEntry] {
		self.board(category).map(|board| board.entries.as_slice()).unwrap_or(&[])
	}
}
