//! Configuration

// Imports
use pftrace::{AccessHistoryLedger, TraceSourceConfig};

/// Configuration
#[derive(Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
	/// Trace source
	pub trace: TraceSourceConfig,

	/// Maximum history length per origin
	pub history_limit: usize,

	/// Strides reported per origin
	pub stride_top_k: usize,

	/// Origins whose history is dumped
	pub history_dump_origins: usize,

	/// Lines dumped per origin
	pub history_dump_len: usize,

	/// Debug output period (in seconds)
	pub debug_output_period_secs: f64,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			trace:                    TraceSourceConfig::default(),
			history_limit:            AccessHistoryLedger::DEFAULT_LIMIT,
			stride_top_k:             4,
			history_dump_origins:     10,
			history_dump_len:         100,
			debug_output_period_secs: 1.0,
		}
	}
}
