use chrono::{TimeZone, Utc};
use relay_primitives::{Location, Node, NodeId, NodeSet, RoleFlags};
use std::collections::BTreeMap;

pub fn node(id: &str, capacity: (u64, u64, u64), country: &str, provider: &str) -> Node {
	let (observed, advertised, weight) = capacity;
	Node {
		id: NodeId::new(id),
		nickname: Some(id.to_lowercase()),
		declared_operator: None,
		observed_capacity: observed,
		advertised_capacity: advertised,
		weight,
		roles: RoleFlags { running: true, valid: true, ..Default::default() },
		location: Location {
			country: Some(country.to_string()),
			country_name: None,
			provider: Some(provider.to_string()),
			provider_name: None,
		},
		platform: Some("Tor 0.4.8.12 on Linux".to_string()),
		first_seen: Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap(),
		last_seen: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
		running: true,
		uptime: BTreeMap::new(),
		bandwidth: BTreeMap::new(),
		validation: None,
		consensus: None,
	}
}

/// Node whose three capacity measurements agree.
pub fn flat(id: &str, capacity: u64, country: &str, provider: &str) -> Node {
	node(id, (capacity, capacity, capacity), country, provider)
}

pub fn node_set(nodes: Vec<Node>) -> NodeSet {
	nodes.into_iter().map(|n| (n.id.clone(), n)).collect()
}
