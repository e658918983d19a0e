//! # Leaderboard Engine
//!
//! Ranks operators in every [`Category`]. Each board is ordered by score descending and then by
//! the operator identity string ascending, so equal scores never depend on iteration order.
//! Ranks are assigned after sorting and are 1-based and contiguous.
//!
//! Reliability boards rank exactly the operators the [`ReliabilityReport`] marks as eligible; the
//! other boards rank every operator with a positive score. A board whose source feed is degraded
//! is reported as unavailable instead of being ranked on empty data.

use engine_reliability::ReliabilityReport;
use relay_primitives::{FeedKind, OperatorSet, RunConfig};
use std::collections::BTreeSet;

mod types;
pub use types::{BoardStatus, Category, Leaderboard, LeaderboardEntry, Leaderboards};

#[cfg(test)]
mod mock;


pub fn rank(
	operators: &OperatorSet,
	reliability: &ReliabilityReport,
	degraded: &BTreeSet<FeedKind>,
	config: &RunConfig,
) -> Leaderboards {
	let boards = Category::ALL
		.into_iter()
		.map(|category| {
			let board = build_board(category, operators, reliability, degraded, config.leaderboard_size);
			(category, board)
		})
		.collect();

	let leaderboards = Leaderboards { boards };
	let ranked = leaderboards.boards.values().filter(|b| b.status == BoardStatus::Ranked).count();
	log::info!("✅ Built {} leaderboards ({} ranked)", leaderboards.boards.len(), ranked);
	leaderboards
}

fn build_board(
	category: Category,
	operators: &OperatorSet,
	reliability: &ReliabilityReport,
	degraded: &BTreeSet<FeedKind>,
	size: usize,
) -> Leaderboard {
	if let Some(feed) = category.source_feed().filter(|feed| degraded.contains(feed)) {
		log::warn!("⚠️ {} leaderboard unavailable: {} feed is degraded", category, feed);
		return Leaderboard {
			category,
			status: BoardStatus::Unavailable { reason: format!("{} feed is degraded", feed) },
			entries: Vec::new(),
		};
	}

	let mut entries: Vec<LeaderboardEntry> = match category.reliability_window() {
		Some(window) => reliability
			.eligible(window)
			.filter_map(|(id, score)| operators.get(id).map(|operator| (operator, score)))
			.map(|(operator, score)| entry(category, operator, score))
			.collect(),
		None => operators
			.values()
			.filter_map(|operator| category.total_score(operator).map(|score| (operator, score)))
			.filter(|(_, score)| *score > 0.0)
			.map(|(operator, score)| entry(category, operator, score))
			.collect(),
	};

	if entries.is_empty() && category.reliability_window().is_some() {
		return Leaderboard { category, status: BoardStatus::InsufficientData, entries };
	}

	sort_and_rank(&mut entries, size);
	Leaderboard { category, status: BoardStatus::Ranked, entries }
}

fn entry(category: Category, operator: &relay_primitives::Operator, score: f64) -> LeaderboardEntry {
	LeaderboardEntry {
		operator: operator.id.clone(),
		label: operator.label.clone(),
		category,
		rank: 0, // assigned after sorting
		score,
		tie_break: operator.id.tie_break_key().to_string(),
	}
}

/// Sorts by (score desc, tie-break asc), keeps the first `size` entries and numbers them from 1.
pub fn sort_and_rank(entries: &mut Vec<LeaderboardEntry>, size: usize) {
	entries.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.tie_break.cmp(&b.tie_break)));
	entries.truncate(size);
	for (index, entry) in entries.iter_mut().enumerate() {
		entry.rank = (index + 1) as u32;
	}
}
