//! Output data

// Imports
use {
	crate::{event::Ip, trace_source::SourceStats},
	std::ops::Range,
};

/// Output data
#[derive(PartialEq, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(bincode::Encode, bincode::Decode)]
pub struct Snapshot {
	pub totals:             Totals,
	pub demand:             Vec<DemandRow>,
	pub prefetch:           Vec<PrefetchRow>,
	pub histories:          Vec<OriginHistory>,
	pub pending_prefetches: u64,
	pub source:             SourceStats,
	pub cycle_span:         Option<Range<u64>>,
}

/// Global totals
#[derive(PartialEq, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(bincode::Encode, bincode::Decode)]
pub struct Totals {
	pub load_access: u64,
	pub load_miss:   u64,
	pub miss_rate:   f64,
	pub pf_issued:   u64,
	pub pf_useful:   u64,
	pub pf_late:     u64,
	pub pf_useless:  u64,
}

/// Demand statistics of an origin
#[derive(PartialEq, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(bincode::Encode, bincode::Decode)]
pub struct DemandRow {
	pub origin:    Ip,
	pub accesses:  u64,
	pub misses:    u64,
	pub miss_rate: f64,

	/// Most frequent strides.
	///
	/// Empty if the origin has less than 2 samples.
	pub strides: Vec<Stride>,
}

/// Stride
#[derive(PartialEq, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(bincode::Encode, bincode::Decode)]
pub struct Stride {
	pub delta:    i64,
	pub count:    u64,
	pub fraction: f64,
}

/// Prefetch statistics of an issuer
#[derive(PartialEq, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(bincode::Encode, bincode::Decode)]
pub struct PrefetchRow {
	pub issuer:    Ip,
	pub issued:    u64,
	pub useful:    u64,
	pub late:      u64,
	pub useless:   u64,
	pub accuracy:  f64,
	pub avg_ahead: f64,
}

/// First lines accessed by an origin
#[derive(PartialEq, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(bincode::Encode, bincode::Decode)]
pub struct OriginHistory {
	pub origin: Ip,
	pub lines:  Vec<u64>,
}
