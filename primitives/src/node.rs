use crate::documents::History;
use crate::operator::OperatorId;
use chrono::{DateTime, Utc};
use core::fmt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Upper end of the fixed normalization scale used by the history feeds.
pub const UPTIME_SCALE_MAX: u16 = 999;

/// Bucket key used when a node does not report a dimension value.
pub const UNKNOWN_BUCKET: &str = "unknown";

/// Opaque node identity; the only key used to join feeds.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
	pub fn new(raw: impl Into<String>) -> Self {
		Self(raw.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Named look-back period over which history is summarized.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Window {
	OneMonth,
	SixMonths,
	OneYear,
	FiveYears,
}

impl Window {
	pub const ALL: [Window; 4] = [Window::OneMonth, Window::SixMonths, Window::OneYear, Window::FiveYears];

	/// Key under which the window appears in the history feeds.
	pub fn feed_key(&self) -> &'static str {
		match self {
			Window::OneMonth => "1_month",
			Window::SixMonths => "6_months",
			Window::OneYear => "1_year",
			Window::FiveYears => "5_years",
		}
	}

	pub fn from_feed_key(key: &str) -> Option<Self> {
		Window::ALL.into_iter().find(|w| w.feed_key() == key)
	}
}

impl fmt::Display for Window {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.feed_key())
	}
}

/// Ordered sequence of present/absent samples for one window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SampleSeries {
	pub interval_secs: u64,
	pub factor: f64,
	pub samples: Vec<Option<u16>>,
}

impl SampleSeries {
	pub fn from_history(history: &History) -> Self {
		Self { interval_secs: history.interval, factor: history.factor, samples: history.values.clone() }
	}

	pub fn present_count(&self) -> usize {
		self.samples.iter().flatten().count()
	}

	pub fn present_sum(&self) -> u64 {
		self.samples.iter().flatten().map(|v| *v as u64).sum()
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleFlags {
	pub guard: bool,
	pub exit: bool,
	pub bad_exit: bool,
	pub fast: bool,
	pub stable: bool,
	pub hsdir: bool,
	pub v2dir: bool,
	pub authority: bool,
	pub valid: bool,
	pub running: bool,
}

impl RoleFlags {
	pub fn from_flag_names<S: AsRef<str>>(names: &[S]) -> Self {
		let mut flags = RoleFlags::default();
		for name in names {
			match name.as_ref() {
				"Guard" => flags.guard = true,
				"Exit" => flags.exit = true,
				"BadExit" => flags.bad_exit = true,
				"Fast" => flags.fast = true,
				"Stable" => flags.stable = true,
				"HSDir" => flags.hsdir = true,
				"V2Dir" => flags.v2dir = true,
				"Authority" => flags.authority = true,
				"Valid" => flags.valid = true,
				"Running" => flags.running = true,
				other => log::trace!("ignoring unknown relay flag {}", other),
			}
		}
		flags
	}

	/// An exit that is not flagged as misbehaving.
	pub fn usable_exit(&self) -> bool {
		self.exit && !self.bad_exit
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
	pub country: Option<String>,
	pub country_name: Option<String>,
	pub provider: Option<String>,
	pub provider_name: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofMethod {
	UriRsa,
	DnsRsa,
	Other,
	Unspecified,
}

impl ProofMethod {
	pub fn from_feed(raw: Option<&str>) -> Self {
		match raw.map(str::trim) {
			Some("uri-rsa") => ProofMethod::UriRsa,
			Some("dns-rsa") => ProofMethod::DnsRsa,
			Some("") | None => ProofMethod::Unspecified,
			Some(_) => ProofMethod::Other,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationStatus {
	pub validated: bool,
	pub proof: ProofMethod,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusStatus {
	pub authority_votes: u32,
	pub measured: bool,
}

/// One network participant, built from a details-feed entry and enriched by the optional feeds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
	pub id: NodeId,
	pub nickname: Option<String>,
	pub declared_operator: Option<String>,
	pub observed_capacity: u64,
	pub advertised_capacity: u64,
	pub weight: u64,
	pub roles: RoleFlags,
	pub location: Location,
	pub platform: Option<String>,
	pub first_seen: DateTime<Utc>,
	pub last_seen: DateTime<Utc>,
	pub running: bool,
	#[serde(default)]
	pub uptime: BTreeMap<Window, SampleSeries>,
	#[serde(default)]
	pub bandwidth: BTreeMap<Window, SampleSeries>,
	pub validation: Option<ValidationStatus>,
	pub consensus: Option<ConsensusStatus>,
}

impl Node {
	/// The conservative minimum of the three capacity measurements.
	pub fn effective_capacity(&self) -> u64 {
		self.observed_capacity.min(self.advertised_capacity).min(self.weight)
	}

	/// Declared operator text with whitespace collapsed, or `None` when absent or blank.
	pub fn normalized_operator(&self) -> Option<String> {
		let raw = self.declared_operator.as_deref()?;
		let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
		if normalized.is_empty() {
			None
		} else {
			Some(normalized)
		}
	}

	pub fn operator_id(&self) -> OperatorId {
		match self.normalized_operator() {
			Some(contact) => OperatorId::declared(&contact),
			None => OperatorId::singleton(&self.id),
		}
	}

	pub fn is_validated(&self) -> bool {
		self.validation.map_or(false, |v| v.validated)
	}
}

pub type NodeSet = BTreeMap<NodeId, Node>;

/// Grouping axis for distributions and concentration analysis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
	Country,
	Provider,
	Operator,
	Platform,
}

impl Dimension {
	pub const ALL: [Dimension; 4] =
		[Dimension::Country, Dimension::Provider, Dimension::Operator, Dimension::Platform];

	pub fn as_str(&self) -> &'static str {
		match self {
			Dimension::Country => "country",
			Dimension::Provider => "provider",
			Dimension::Operator => "operator",
			Dimension::Platform => "platform",
		}
	}

	pub fn bucket_key(&self, node: &Node) -> String {
		match self {
			Dimension::Country => non_blank(node.location.country.as_deref())
				.map(|c| c.to_ascii_lowercase())
				.unwrap_or_else(|| UNKNOWN_BUCKET.to_string()),
			Dimension::Provider => non_blank(node.location.provider.as_deref())
				.map(|p| p.to_ascii_uppercase())
				.unwrap_or_else(|| UNKNOWN_BUCKET.to_string()),
			Dimension::Operator => node.operator_id().as_str().to_string(),
			Dimension::Platform => non_blank(node.platform.as_deref())
				.and_then(|p| p.split_once(" on ").map(|(_, os)| os.trim().to_string()))
				.filter(|os| !os.is_empty())
				.unwrap_or_else(|| UNKNOWN_BUCKET.to_string()),
		}
	}
}

impl fmt::Display for Dimension {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

fn non_blank(value: Option<&str>) -> Option<&str> {
	value.map(str::trim).filter(|v| !v.is_empty())
}
