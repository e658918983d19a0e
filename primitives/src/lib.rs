//! Types shared by every stage of the relaywatch pipeline.
//!
//! The fetch layer produces [`documents::FeedPayload`] values, the reconciler turns them into
//! [`node::Node`] and [`operator::Operator`] records, and the engines read those records
//! together with the immutable [`config::RunConfig`] snapshot.

pub mod config;
pub mod documents;
pub mod feeds;
pub mod node;
pub mod operator;

#[cfg(test)]
mod tests;

pub use config::{ConfigError, ReliabilityConfig, RunConfig};
pub use documents::{FeedPayload, History, SchemaError};
pub use feeds::{FeedConfig, FeedDescriptor, FeedKind};
pub use node::{
	ConsensusStatus, Dimension, Location, Node, NodeId, NodeSet, ProofMethod, RoleFlags,
	SampleSeries, ValidationStatus, Window, UPTIME_SCALE_MAX,
};
pub use operator::{group_operators, Operator, OperatorId, OperatorSet, OperatorTotals};
