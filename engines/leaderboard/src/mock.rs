use chrono::{TimeZone, Utc};
use engine_reliability::ReliabilityReport;
use relay_primitives::{
	Location, Node, NodeId, NodeSet, OperatorSet, ProofMethod, ReliabilityConfig, RoleFlags, SampleSeries,
	ValidationStatus, Window, UPTIME_SCALE_MAX,
};
use std::collections::BTreeMap;

pub fn node(id: &str, operator: &str, capacity: (u64, u64, u64), country: &str) -> Node {
	let (observed, advertised, weight) = capacity;
	Node {
		id: NodeId::new(id),
		nickname: Some(format!("nick-{}", id)),
		declared_operator: Some(operator.to_string()),
		observed_capacity: observed,
		advertised_capacity: advertised,
		weight,
		roles: RoleFlags::default(),
		location: Location {
			country: Some(country.to_string()),
			country_name: None,
			provider: Some(format!("AS-{}", country)),
			provider_name: None,
		},
		platform: None,
		first_seen: Utc.with_ymd_and_hms(2020, 2, 2, 0, 0, 0).unwrap(),
		last_seen: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
		running: true,
		uptime: BTreeMap::new(),
		bandwidth: BTreeMap::new(),
		validation: None,
		consensus: None,
	}
}

pub fn validated(mut node: Node) -> Node {
	node.validation = Some(ValidationStatus { validated: true, proof: ProofMethod::DnsRsa });
	node
}

/// Full-scale uptime over `samples` samples in the given window.
pub fn always_up(mut node: Node, window: Window, samples: usize) -> Node {
	node.uptime.insert(
		window,
		SampleSeries { interval_secs: 3_600, factor: 1.0, samples: vec![Some(UPTIME_SCALE_MAX); samples] },
	);
	node
}

pub fn node_set(nodes: Vec<Node>) -> NodeSet {
	nodes.into_iter().map(|n| (n.id.clone(), n)).collect()
}

pub use relay_primitives::group_operators as operators;

pub fn reliability(nodes: &NodeSet, operators: &OperatorSet, min_operator_size: usize) -> ReliabilityReport {
	let config = ReliabilityConfig { min_operator_size, ..Default::default() };
	engine_reliability::score(nodes, operators, &config)
}
