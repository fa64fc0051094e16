//! Analysis engine

// Imports
use {
	crate::{
		correlation::{PrefetchCorrelationTable, Resolution},
		data,
		event::{AccessEvent, AccessKind, Ip},
		history::{AccessHistoryLedger, StrideDistribution},
		metrics::{DemandStats, GlobalTotals, MetricsAggregator, PrefetchStats},
		trace_source::SourceStats,
	},
	itertools::Itertools,
	std::{
		fmt,
		ops::Range,
		time::{Duration, Instant},
	},
};

/// Engine configuration
#[derive(Clone, Debug)]
pub struct EngineConfig {
	/// Maximum history length per origin
	pub history_limit: usize,

	/// Debug output period
	///
	/// Interval in which to log progress while running
	pub debug_output_period: Duration,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			history_limit:       AccessHistoryLedger::DEFAULT_LIMIT,
			debug_output_period: Duration::from_secs(1),
		}
	}
}

/// Analysis engine.
///
/// Processes events strictly in order: a demand access is only ever
/// correlated with prefetches that came before it.
#[derive(Clone, Debug)]
pub struct AnalysisEngine {
	/// Debug output period
	debug_output_period: Duration,

	/// History ledger
	history: AccessHistoryLedger,

	/// Correlation table
	correlation: PrefetchCorrelationTable,

	/// Metrics
	metrics: MetricsAggregator,
}

impl AnalysisEngine {
	/// Creates a new engine
	pub fn new(config: EngineConfig) -> Self {
		Self {
			debug_output_period: config.debug_output_period,
			history:             AccessHistoryLedger::new(config.history_limit),
			correlation:         PrefetchCorrelationTable::new(),
			metrics:             MetricsAggregator::new(),
		}
	}

	/// Processes a single event.
	///
	/// Returns the resolution of a pending prefetch, if the event consumed one.
	pub fn process(&mut self, event: AccessEvent) -> Option<Resolution> {
		match event.kind {
			AccessKind::Prefetch => {
				self.correlation.on_prefetch(event.line, event.origin, event.cycle);
				self.metrics.record_prefetch_issued(event.origin);
				None
			},
			AccessKind::Load => {
				self.metrics.record_demand(event.origin, event.outcome);
				self.history.record(event.origin, event.line);

				let resolution = self.correlation.on_demand(event.line, event.cycle, event.outcome)?;
				tracing::trace!(?event, ?resolution, "Resolved prefetch");
				self.metrics.record_resolution(&resolution);
				Some(resolution)
			},
			AccessKind::Other => None,
		}
	}

	/// Processes all `events`.
	///
	/// Stopping early (e.g. by limiting `events`) leaves the statistics valid
	/// for the prefix that was processed.
	pub fn run(&mut self, events: impl IntoIterator<Item = AccessEvent>) -> RunOutput {
		// Note: We start in the past so that we output right away at the start
		let start_time = Instant::now();
		let mut last_debug_time = start_time.checked_sub(self.debug_output_period).unwrap_or(start_time);

		let mut events_processed = 0;
		let mut first_cycle = None;
		let mut last_cycle = None;
		for event in events {
			// Note: Cycles should be non-decreasing, but ties and small
			//       reorderings are tolerated.
			first_cycle.get_or_insert(event.cycle);
			last_cycle = Some(event.cycle);

			self.process(event);
			events_processed += 1;

			// Then show debug output, if it's been long enough
			let cur_time = Instant::now();
			if cur_time.duration_since(last_debug_time) >= self.debug_output_period {
				tracing::info!(
					"[{events_processed} events] Debug: {}",
					pftrace_util::DisplayWrapper::new(|f| self.fmt_debug(f))
				);
				last_debug_time = cur_time;
			}
		}

		tracing::debug!(events_processed, elapsed = ?start_time.elapsed(), "Finished processing events");
		RunOutput {
			events_processed,
			cycle_span: first_cycle.zip(last_cycle).map(|(first, last)| first..last.saturating_add(1)),
		}
	}

	/// Formats debug output to `f`.
	pub fn fmt_debug(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
		// Note: Start with a newline, since we're a multi-line output
		f.pad("\n")?;

		let totals = self.metrics.totals();
		writeln!(
			f,
			"Loads: {} ({} misses, {:.2}%)",
			totals.load_access,
			totals.load_miss,
			totals.miss_rate()
		)?;

		let (useful_pct, late_pct, useless_pct) = totals.pf_breakdown();
		writeln!(
			f,
			"Prefetches: {} (useful {useful_pct:.1}%, late {late_pct:.1}%, unresolved {useless_pct:.1}%)",
			totals.pf_issued,
		)?;

		let origin_miss_rates = self
			.metrics
			.demand_table()
			.iter()
			.map(|(_, stats)| stats.miss_rate())
			.collect::<average::Variance>();
		writeln!(
			f,
			"Average origin miss rate: {:.2}% ± {:.2}%",
			origin_miss_rates.mean(),
			origin_miss_rates.error()
		)?;

		write!(f, "Pending prefetches: {}", self.correlation.pending_len())
	}

	/// Returns the global totals
	pub fn totals(&self) -> GlobalTotals {
		self.metrics.totals()
	}

	/// Returns the demand table, by descending misses
	pub fn demand_table(&self) -> Vec<(Ip, DemandStats)> {
		self.metrics.demand_table()
	}

	/// Returns the prefetch table, by descending issued prefetches
	pub fn prefetch_table(&self) -> Vec<(Ip, PrefetchStats)> {
		self.metrics.prefetch_table()
	}

	/// Returns the `top_k` most frequent strides of `origin`
	pub fn stride_distribution(&self, origin: Ip, top_k: usize) -> Option<StrideDistribution> {
		self.history.stride_distribution(origin, top_k)
	}

	/// Returns the history ledger
	pub fn history(&self) -> &AccessHistoryLedger {
		&self.history
	}

	/// Returns the metrics
	pub fn metrics(&self) -> &MetricsAggregator {
		&self.metrics
	}

	/// Returns the number of prefetches still pending
	pub fn pending_prefetches(&self) -> usize {
		self.correlation.pending_len()
	}

	/// Builds a snapshot of the current statistics.
	///
	/// Each demand row includes its `stride_top_k` most frequent strides, and
	/// the first `history_len` lines of the `top_history` origins with the most
	/// samples are included.
	pub fn snapshot(
		&self,
		run_output: &RunOutput,
		source: &SourceStats,
		stride_top_k: usize,
		top_history: usize,
		history_len: usize,
	) -> data::Snapshot {
		let totals = self.totals();
		let demand = self
			.demand_table()
			.into_iter()
			.map(|(origin, stats)| data::DemandRow {
				origin,
				accesses: stats.accesses,
				misses: stats.misses,
				miss_rate: stats.miss_rate(),
				strides: self
					.stride_distribution(origin, stride_top_k)
					.map(|dist| {
						dist.strides
							.into_iter()
							.map(|share| data::Stride {
								delta:    share.delta,
								count:    share.count as u64,
								fraction: share.fraction,
							})
							.collect()
					})
					.unwrap_or_default(),
			})
			.collect();

		let prefetch = self
			.prefetch_table()
			.into_iter()
			.map(|(issuer, stats)| data::PrefetchRow {
				issuer,
				issued: stats.issued,
				useful: stats.useful,
				late: stats.late,
				useless: stats.useless(),
				accuracy: stats.accuracy(),
				avg_ahead: stats.avg_timeliness(),
			})
			.collect();

		let histories = self
			.history
			.origins_by_samples()
			.into_iter()
			.take(top_history)
			.map(|(origin, _)| data::OriginHistory {
				origin,
				lines: self
					.history
					.history(origin)
					.iter()
					.take(history_len)
					.map(|line| line.to_u64())
					.collect_vec(),
			})
			.collect();

		data::Snapshot {
			totals: data::Totals {
				load_access: totals.load_access,
				load_miss:   totals.load_miss,
				miss_rate:   totals.miss_rate(),
				pf_issued:   totals.pf_issued,
				pf_useful:   totals.pf_useful,
				pf_late:     totals.pf_late,
				pf_useless:  totals.pf_useless(),
			},
			demand,
			prefetch,
			histories,
			pending_prefetches: self.pending_prefetches() as u64,
			source: source.clone(),
			cycle_span: run_output.cycle_span.clone(),
		}
	}
}

impl Default for AnalysisEngine {
	fn default() -> Self {
		Self::new(EngineConfig::default())
	}
}

/// Output for [`AnalysisEngine::run`]
#[derive(Clone, Default, Debug)]
pub struct RunOutput {
	/// Events processed
	pub events_processed: u64,

	/// Cycle span.
	///
	/// The end saturates at `u64::MAX`, so a final cycle of `u64::MAX` is
	/// excluded from it.
	pub cycle_span: Option<Range<u64>>,
}
