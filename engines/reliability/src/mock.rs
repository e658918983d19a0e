use chrono::{TimeZone, Utc};
use relay_primitives::{
	Location, Node, NodeId, NodeSet, RoleFlags, SampleSeries, Window, UPTIME_SCALE_MAX,
};
use std::collections::BTreeMap;

pub fn node(id: &str, operator: Option<&str>, capacity: u64) -> Node {
	Node {
		id: NodeId::new(id),
		nickname: None,
		declared_operator: operator.map(str::to_string),
		observed_capacity: capacity,
		advertised_capacity: capacity,
		weight: capacity,
		roles: RoleFlags::default(),
		location: Location::default(),
		platform: None,
		first_seen: Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap(),
		last_seen: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
		running: true,
		uptime: BTreeMap::new(),
		bandwidth: BTreeMap::new(),
		validation: None,
		consensus: None,
	}
}

pub fn series(samples: Vec<Option<u16>>) -> SampleSeries {
	SampleSeries { interval_secs: 86_400, factor: 1.0, samples }
}

pub fn scaled(samples: Vec<Option<u16>>, factor: f64) -> SampleSeries {
	SampleSeries { factor, ..series(samples) }
}

/// `up` samples at the scale maximum followed by `down` samples at zero.
pub fn up_down(up: usize, down: usize) -> SampleSeries {
	let mut samples = vec![Some(UPTIME_SCALE_MAX); up];
	samples.extend(vec![Some(0); down]);
	series(samples)
}

pub fn with_uptime(mut node: Node, window: Window, series: SampleSeries) -> Node {
	node.uptime.insert(window, series);
	node
}

pub fn located(mut node: Node, country: &str) -> Node {
	node.location.country = Some(country.to_string());
	node
}

pub fn node_set(nodes: Vec<Node>) -> NodeSet {
	nodes.into_iter().map(|n| (n.id.clone(), n)).collect()
}

pub use relay_primitives::group_operators as operators;
