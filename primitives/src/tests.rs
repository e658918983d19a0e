use crate::documents::SchemaError;
use crate::*;
use assert_matches::assert_matches;
use chrono::{TimeZone, Utc};
use std::collections::BTreeMap;

fn node(id: &str, contact: Option<&str>, observed: u64, advertised: u64, weight: u64) -> Node {
	Node {
		id: NodeId::new(id),
		nickname: Some(format!("nick{}", id)),
		declared_operator: contact.map(str::to_string),
		observed_capacity: observed,
		advertised_capacity: advertised,
		weight,
		roles: RoleFlags::default(),
		location: Location::default(),
		platform: None,
		first_seen: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
		last_seen: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
		running: true,
		uptime: BTreeMap::new(),
		bandwidth: BTreeMap::new(),
		validation: None,
		consensus: None,
	}
}

#[test]
fn effective_capacity_is_minimum_of_three() {
	assert_eq!(node("A", None, 10, 50, 30).effective_capacity(), 10);
	assert_eq!(node("A", None, 100, 90, 80).effective_capacity(), 80);
	assert_eq!(node("A", None, 60, 50, 55).effective_capacity(), 50);
}

#[test]
fn blank_operator_becomes_singleton() {
	let blank = node("AAA", Some("   "), 1, 1, 1);
	assert!(blank.operator_id().is_singleton());
	assert_eq!(blank.operator_id(), OperatorId::singleton(&NodeId::new("AAA")));

	let absent = node("BBB", None, 1, 1, 1);
	assert_ne!(blank.operator_id(), absent.operator_id());
}

#[test]
fn declared_operator_whitespace_is_normalized() {
	let a = node("A", Some("  email:ops@example.org   url:example.org "), 1, 1, 1);
	let b = node("B", Some("email:ops@example.org url:example.org"), 1, 1, 1);
	assert_eq!(a.operator_id(), b.operator_id());
	assert!(!a.operator_id().is_singleton());
}

#[test]
fn declared_text_cannot_collide_with_singleton() {
	let sneaky = node("X", Some("node:Y"), 1, 1, 1);
	let singleton = node("Y", None, 1, 1, 1);
	assert_ne!(sneaky.operator_id(), singleton.operator_id());
}

#[test]
fn operator_totals_are_derived_from_members() {
	let mut exit = node("A", Some("ops"), 100, 90, 80);
	exit.roles = RoleFlags::from_flag_names(&["Exit", "Guard", "Running"]);
	exit.location.country = Some("DE".into());
	exit.validation = Some(ValidationStatus { validated: true, proof: ProofMethod::DnsRsa });
	let mut bad_exit = node("B", Some("ops"), 50, 60, 55);
	bad_exit.roles = RoleFlags::from_flag_names(&["Exit", "BadExit"]);
	bad_exit.location.country = Some("de".into());
	bad_exit.running = false;

	let operator = Operator::from_members(OperatorId::declared("ops"), &[&exit, &bad_exit]);
	assert_eq!(operator.totals.node_count, 2);
	assert_eq!(operator.totals.running_count, 1);
	assert_eq!(operator.totals.effective_capacity, 130);
	assert_eq!(operator.totals.weight, 135);
	assert_eq!(operator.totals.exit_capacity, 80);
	assert_eq!(operator.totals.guard_capacity, 80);
	assert_eq!(operator.totals.countries.len(), 1);
	assert_eq!(operator.totals.validated_count, 1);
	assert_eq!(operator.validation.len(), 1);
	assert_eq!(operator.label, "ops");
}

#[test]
fn platform_dimension_uses_operating_system() {
	let mut n = node("A", None, 1, 1, 1);
	n.platform = Some("Tor 0.4.8.12 on Linux".into());
	assert_eq!(Dimension::Platform.bucket_key(&n), "Linux");
	n.platform = Some("weird".into());
	assert_eq!(Dimension::Platform.bucket_key(&n), "unknown");
}

#[test]
fn history_values_above_scale_are_rejected() {
	let payload = br#"{"relays":[{"fingerprint":"A","uptime":{"1_month":{
		"first":"2024-01-01 00:00:00","last":"2024-01-31 00:00:00",
		"interval":14400,"factor":0.001,"values":[999,null,1000]}}}]}"#;
	assert_matches!(
		FeedPayload::parse(FeedKind::Uptime, payload),
		Err(SchemaError::Invalid { feed: FeedKind::Uptime, .. })
	);
}

#[test]
fn details_document_parses_and_keeps_gaps() {
	let payload = br#"{"relays_published":"2024-05-01 12:00:00","relays":[{
		"fingerprint":"AAAA","observed_bandwidth":10,"advertised_bandwidth":50,
		"consensus_weight":30,"flags":["Running","Exit"],"as":"AS3320",
		"first_seen":"2020-01-01 00:00:00","last_seen":"2024-05-01 11:00:00","running":true}]}"#;
	let parsed = FeedPayload::parse(FeedKind::Details, payload).expect("valid details");
	assert_matches!(&parsed, FeedPayload::Details(doc) if doc.relays[0].as_number.as_deref() == Some("AS3320"));
	assert_eq!(parsed.entry_count(), 1);

	let uptime = br#"{"relays":[{"fingerprint":"A","uptime":{"1_month":{
		"first":"2024-01-01 00:00:00","last":"2024-01-31 00:00:00",
		"interval":14400,"values":[999,null,0]}}}]}"#;
	let parsed = FeedPayload::parse(FeedKind::Uptime, uptime).expect("valid uptime");
	let FeedPayload::Uptime(doc) = parsed else { panic!("expected uptime payload") };
	let series = SampleSeries::from_history(&doc.relays[0].uptime["1_month"]);
	assert_eq!(series.present_count(), 2);
	assert_eq!(series.present_sum(), 999);
}

#[test]
fn malformed_json_is_a_schema_error() {
	assert_matches!(
		FeedPayload::parse(FeedKind::Validation, b"{not json"),
		Err(SchemaError::Malformed { feed: FeedKind::Validation, .. })
	);
	assert!(FeedPayload::empty(FeedKind::Details).is_none());
	assert_eq!(FeedPayload::empty(FeedKind::Consensus).map(|p| p.entry_count()), Some(0));
}

#[test]
fn default_config_is_valid() {
	let config = RunConfig::default();
	assert_matches!(config.validate(), Ok(()));
	assert_eq!(config.concentration_threshold_ppm(), 50_000);
	assert_eq!(config.feed_set().len(), 5);
	assert!(config.feed_set().iter().filter(|f| f.required()).count() == 1);
}

#[test]
fn config_without_details_feed_is_rejected() {
	let mut config = RunConfig::default();
	config.feeds.remove(&FeedKind::Details);
	assert_matches!(config.validate(), Err(ConfigError::Invalid(_)));

	let mut config = RunConfig::default();
	config.worker_pool_size = 0;
	assert_matches!(config.validate(), Err(ConfigError::Invalid(_)));
}

#[test]
fn config_file_fills_missing_fields_with_defaults() {
	let parsed: RunConfig = serde_json::from_str(
		r#"{"worker_pool_size":2,"reliability":{"min_samples":10},
		"feeds":{"details":{"url":"http://localhost/details","ttl_secs":60,"timeout_secs":5}}}"#,
	)
	.expect("config parses");
	assert_eq!(parsed.worker_pool_size, 2);
	assert_eq!(parsed.reliability.min_samples, 10);
	assert_eq!(parsed.reliability.min_operator_size, 25);
	assert_eq!(parsed.feeds.len(), 1);
	assert_matches!(parsed.validate(), Ok(()));
}

#[test]
fn window_keys_round_trip() {
	for window in Window::ALL {
		assert_eq!(Window::from_feed_key(window.feed_key()), Some(window));
	}
	assert_eq!(Window::from_feed_key("3_days"), None);
}
