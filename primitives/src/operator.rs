use crate::node::{Dimension, Node, NodeId, NodeSet, ValidationStatus, UNKNOWN_BUCKET};
use core::fmt;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Opaque grouping key derived from a node's declared operator text.
///
/// Declared and singleton keys live in separate namespaces so free text can never collide with a
/// node identity. The string form doubles as the leaderboard tie-break key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperatorId(String);

const DECLARED_PREFIX: &str = "contact:";
const SINGLETON_PREFIX: &str = "node:";

impl OperatorId {
	pub fn declared(contact: &str) -> Self {
		Self(format!("{}{}", DECLARED_PREFIX, contact))
	}

	pub fn singleton(node: &NodeId) -> Self {
		Self(format!("{}{}", SINGLETON_PREFIX, node))
	}

	pub fn is_singleton(&self) -> bool {
		self.0.starts_with(SINGLETON_PREFIX)
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	pub fn tie_break_key(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for OperatorId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Aggregates derived from the member nodes when the operator is formed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorTotals {
	pub node_count: usize,
	pub running_count: usize,
	pub effective_capacity: u64,
	pub weight: u64,
	pub exit_capacity: u64,
	pub guard_capacity: u64,
	pub countries: BTreeSet<String>,
	pub providers: BTreeSet<String>,
	pub validated_count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Operator {
	pub id: OperatorId,
	/// Display text: the declared operator, or the node nickname for singletons.
	pub label: String,
	pub members: BTreeSet<NodeId>,
	pub validation: BTreeMap<NodeId, ValidationStatus>,
	pub totals: OperatorTotals,
}

impl Operator {
	pub fn from_members(id: OperatorId, members: &[&Node]) -> Self {
		let mut totals = OperatorTotals::default();
		let mut validation = BTreeMap::new();

		for node in members {
			let capacity = node.effective_capacity();
			totals.node_count += 1;
			if node.running {
				totals.running_count += 1;
			}
			totals.effective_capacity = totals.effective_capacity.saturating_add(capacity);
			totals.weight = totals.weight.saturating_add(node.weight);
			if node.roles.usable_exit() {
				totals.exit_capacity = totals.exit_capacity.saturating_add(capacity);
			}
			if node.roles.guard {
				totals.guard_capacity = totals.guard_capacity.saturating_add(capacity);
			}
			for (dimension, seen) in
				[(Dimension::Country, &mut totals.countries), (Dimension::Provider, &mut totals.providers)]
			{
				let key = dimension.bucket_key(node);
				if key != UNKNOWN_BUCKET {
					seen.insert(key);
				}
			}
			if let Some(status) = node.validation {
				if status.validated {
					totals.validated_count += 1;
				}
				validation.insert(node.id.clone(), status);
			}
		}

		let label = match members.first() {
			Some(node) if id.is_singleton() => {
				node.nickname.clone().unwrap_or_else(|| node.id.to_string())
			},
			Some(node) => node.normalized_operator().unwrap_or_else(|| id.to_string()),
			None => id.to_string(),
		};

		Self {
			id,
			label,
			members: members.iter().map(|n| n.id.clone()).collect(),
			validation,
			totals,
		}
	}
}

pub type OperatorSet = BTreeMap<OperatorId, Operator>;

/// Groups every node under exactly one operator and derives the operator totals once.
pub fn group_operators(nodes: &NodeSet) -> OperatorSet {
	let mut members: BTreeMap<OperatorId, Vec<&Node>> = BTreeMap::new();
	for node in nodes.values() {
		members.entry(node.operator_id()).or_default().push(node);
	}

	members
		.into_iter()
		.map(|(id, nodes)| {
			let operator = Operator::from_members(id.clone(), &nodes);
			(id, operator)
		})
		.collect()
}
