//! Prefetch trace analyzer (`pftrace`)
//!
//! Analyzes memory-access traces recorded by a cache simulator, collecting
//! per-instruction miss and stride statistics and matching prefetches with
//! the demand accesses they served.

// Modules
pub mod correlation;
pub mod data;
pub mod engine;
pub mod event;
pub mod history;
pub mod metrics;
pub mod trace_source;

// Exports
pub use self::{
	correlation::PrefetchCorrelationTable,
	engine::{AnalysisEngine, EngineConfig},
	event::{AccessEvent, AccessKind, Ip, LineAddr, Outcome},
	history::AccessHistoryLedger,
	metrics::MetricsAggregator,
	trace_source::{TraceFormat, TraceSource, TraceSourceConfig},
};
