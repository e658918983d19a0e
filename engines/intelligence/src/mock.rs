use chrono::{TimeZone, Utc};
use engine_statistics::NetworkStatistics;
use relay_primitives::{Location, Node, NodeId, NodeSet, RoleFlags, RunConfig};
use std::collections::BTreeMap;

pub fn node(id: &str, capacity: (u64, u64, u64), country: &str, provider: &str) -> Node {
	let (observed, advertised, weight) = capacity;
	Node {
		id: NodeId::new(id),
		nickname: None,
		declared_operator: Some(format!("operator of {}", country)),
		observed_capacity: observed,
		advertised_capacity: advertised,
		weight,
		roles: RoleFlags::default(),
		location: Location {
			country: Some(country.to_string()),
			country_name: None,
			provider: Some(provider.to_string()),
			provider_name: None,
		},
		platform: None,
		first_seen: Utc.with_ymd_and_hms(2022, 3, 1, 0, 0, 0).unwrap(),
		last_seen: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
		running: true,
		uptime: BTreeMap::new(),
		bandwidth: BTreeMap::new(),
		validation: None,
		consensus: None,
	}
}

pub fn node_set(nodes: Vec<Node>) -> NodeSet {
	nodes.into_iter().map(|n| (n.id.clone(), n)).collect()
}

pub fn stats(nodes: &NodeSet) -> NetworkStatistics {
	engine_statistics::compute(nodes, &RunConfig::default())
}

/// Countries `c1`..`c7` hold `i` nodes of capacity 10 each; `zz` holds 30 nodes of capacity 1.
pub fn clustered_network() -> NodeSet {
	let mut nodes = Vec::new();
	for i in 1..=7 {
		for j in 0..i {
			nodes.push(node(&format!("C{}N{}", i, j), (10, 10, 10), &format!("c{}", i), "AS1"));
		}
	}
	for j in 0..30 {
		nodes.push(node(&format!("ZZN{}", j), (1, 1, 1), "zz", "AS1"));
	}
	node_set(nodes)
}
