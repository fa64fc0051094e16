//! Metrics

// Imports
use {
	crate::{
		correlation::{Classification, Resolution},
		event::{Ip, Outcome},
	},
	itertools::Itertools,
	std::collections::HashMap,
};

/// Metrics aggregator.
///
/// Demand and prefetch statistics are kept separately, since an origin
/// may both load and prefetch.
#[derive(Clone, Default, Debug)]
pub struct MetricsAggregator {
	/// Demand statistics, by origin
	demand: HashMap<Ip, DemandStats>,

	/// Prefetch statistics, by issuer
	prefetch: HashMap<Ip, PrefetchStats>,

	// Global counters
	load_access: u64,
	load_miss:   u64,
	pf_issued:   u64,
}

impl MetricsAggregator {
	/// Creates an empty aggregator
	pub fn new() -> Self {
		Self::default()
	}

	/// Records a demand access
	pub fn record_demand(&mut self, origin: Ip, outcome: Option<Outcome>) {
		let stats = self.demand.entry(origin).or_default();
		stats.accesses += 1;
		self.load_access += 1;

		if outcome == Some(Outcome::Miss) {
			stats.misses += 1;
			self.load_miss += 1;
		}
	}

	/// Records an issued prefetch
	pub fn record_prefetch_issued(&mut self, issuer: Ip) {
		self.prefetch.entry(issuer).or_default().issued += 1;
		self.pf_issued += 1;
	}

	/// Records a prefetch resolution
	pub fn record_resolution(&mut self, resolution: &Resolution) {
		let stats = self.prefetch.entry(resolution.issuer).or_default();
		match resolution.classification {
			Classification::Useful => {
				stats.useful += 1;
				stats.timeliness_sum = stats.timeliness_sum.saturating_add(resolution.ahead);
			},
			Classification::Late => stats.late += 1,
		}
	}

	/// Returns the demand statistics of `origin`
	pub fn demand(&self, origin: Ip) -> Option<&DemandStats> {
		self.demand.get(&origin)
	}

	/// Returns the prefetch statistics of `issuer`
	pub fn prefetch(&self, issuer: Ip) -> Option<&PrefetchStats> {
		self.prefetch.get(&issuer)
	}

	/// Returns the global totals
	pub fn totals(&self) -> GlobalTotals {
		GlobalTotals {
			load_access: self.load_access,
			load_miss:   self.load_miss,
			pf_issued:   self.pf_issued,
			pf_useful:   self.prefetch.values().map(|stats| stats.useful).sum(),
			pf_late:     self.prefetch.values().map(|stats| stats.late).sum(),
		}
	}

	/// Returns the demand table, by descending misses
	pub fn demand_table(&self) -> Vec<(Ip, DemandStats)> {
		self.demand
			.iter()
			.map(|(&origin, &stats)| (origin, stats))
			.sorted_unstable_by(|(lhs_origin, lhs), (rhs_origin, rhs)| {
				rhs.misses.cmp(&lhs.misses).then(lhs_origin.cmp(rhs_origin))
			})
			.collect()
	}

	/// Returns the prefetch table, by descending issued prefetches
	pub fn prefetch_table(&self) -> Vec<(Ip, PrefetchStats)> {
		self.prefetch
			.iter()
			.map(|(&issuer, &stats)| (issuer, stats))
			.sorted_unstable_by(|(lhs_issuer, lhs), (rhs_issuer, rhs)| {
				rhs.issued.cmp(&lhs.issued).then(lhs_issuer.cmp(rhs_issuer))
			})
			.collect()
	}
}

/// Demand statistics of an origin
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
pub struct DemandStats {
	pub accesses: u64,
	pub misses:   u64,
}

impl DemandStats {
	/// Returns the miss rate, in percentage
	pub fn miss_rate(&self) -> f64 {
		self::percentage(self.misses, self.accesses)
	}
}

/// Prefetch statistics of an issuer
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
pub struct PrefetchStats {
	pub issued: u64,
	pub useful: u64,
	pub late:   u64,

	/// Sum of cycles ahead over all useful prefetches.
	///
	/// Saturates at `u64::MAX`.
	pub timeliness_sum: u64,
}

impl PrefetchStats {
	/// Returns the number of prefetches never consumed
	pub fn useless(&self) -> u64 {
		self.issued.saturating_sub(self.useful.saturating_add(self.late))
	}

	/// Returns the accuracy (useful / issued), in percentage
	pub fn accuracy(&self) -> f64 {
		self::percentage(self.useful, self.issued)
	}

	/// Returns the average number of cycles useful prefetches were issued ahead
	pub fn avg_timeliness(&self) -> f64 {
		match self.useful {
			0 => 0.0,
			useful => self.timeliness_sum as f64 / useful as f64,
		}
	}
}

/// Global totals
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
pub struct GlobalTotals {
	pub load_access: u64,
	pub load_miss:   u64,
	pub pf_issued:   u64,
	pub pf_useful:   u64,
	pub pf_late:     u64,
}

impl GlobalTotals {
	/// Returns the number of prefetches never consumed
	pub fn pf_useless(&self) -> u64 {
		self.pf_issued.saturating_sub(self.pf_useful.saturating_add(self.pf_late))
	}

	/// Returns the load miss rate, in percentage
	pub fn miss_rate(&self) -> f64 {
		self::percentage(self.load_miss, self.load_access)
	}

	/// Returns the useful / late / useless prefetches, in percentage of those issued
	pub fn pf_breakdown(&self) -> (f64, f64, f64) {
		(
			self::percentage(self.pf_useful, self.pf_issued),
			self::percentage(self.pf_late, self.pf_issued),
			self::percentage(self.pf_useless(), self.pf_issued),
		)
	}
}

/// Returns `part / total` as a percentage, or `0` if `total` is `0`
fn percentage(part: u64, total: u64) -> f64 {
	match total {
		0 => 0.0,
		_ => 100.0 * (part as f64 / total as f64),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn resolution(issuer: Ip, ahead: u64, classification: Classification) -> Resolution {
		Resolution {
			issuer,
			issue_cycle: 0,
			ahead,
			classification,
		}
	}

	#[test]
	fn demand_counts() {
		let mut metrics = MetricsAggregator::new();
		let origin = Ip::new(0x10);
		metrics.record_demand(origin, Some(Outcome::Miss));
		metrics.record_demand(origin, Some(Outcome::Hit));
		metrics.record_demand(origin, None);

		let stats = metrics.demand(origin).unwrap();
		assert_eq!(*stats, DemandStats {
			accesses: 3,
			misses:   1,
		});
		assert!((stats.miss_rate() - 100.0 / 3.0).abs() < 1e-9);
		assert_eq!(metrics.totals().load_access, 3);
		assert_eq!(metrics.totals().load_miss, 1);
	}

	#[test]
	fn prefetch_counts() {
		let mut metrics = MetricsAggregator::new();
		let issuer = Ip::new(0x20);
		for _ in 0..4 {
			metrics.record_prefetch_issued(issuer);
		}
		metrics.record_resolution(&resolution(issuer, 6, Classification::Useful));
		metrics.record_resolution(&resolution(issuer, 10, Classification::Useful));
		metrics.record_resolution(&resolution(issuer, 1, Classification::Late));

		let stats = metrics.prefetch(issuer).unwrap();
		assert_eq!(stats.useful, 2);
		assert_eq!(stats.late, 1);
		assert_eq!(stats.useless(), 1);
		assert_eq!(stats.timeliness_sum, 16);
		assert_eq!(stats.avg_timeliness(), 8.0);
		assert_eq!(stats.accuracy(), 50.0);

		let totals = metrics.totals();
		assert_eq!(totals.pf_issued, 4);
		assert_eq!(totals.pf_useful + totals.pf_late + totals.pf_useless(), totals.pf_issued);
		assert_eq!(totals.pf_breakdown(), (50.0, 25.0, 25.0));
	}

	#[test]
	fn empty_metrics_are_zero() {
		let metrics = MetricsAggregator::new();
		let totals = metrics.totals();
		assert_eq!(totals, GlobalTotals::default());
		assert_eq!(totals.miss_rate(), 0.0);
		assert_eq!(totals.pf_breakdown(), (0.0, 0.0, 0.0));
		assert_eq!(PrefetchStats::default().accuracy(), 0.0);
		assert_eq!(PrefetchStats::default().avg_timeliness(), 0.0);
	}

	#[test]
	fn useless_is_floored() {
		let stats = PrefetchStats {
			issued: 1,
			useful: 1,
			late: 1,
			timeliness_sum: 0,
		};
		assert_eq!(stats.useless(), 0);

		let stats = PrefetchStats {
			issued: 2,
			useful: u64::MAX,
			late: 1,
			timeliness_sum: 0,
		};
		assert_eq!(stats.useless(), 0);

		let totals = GlobalTotals {
			pf_issued: 2,
			pf_useful: 1,
			pf_late: u64::MAX,
			..GlobalTotals::default()
		};
		assert_eq!(totals.pf_useless(), 0);
	}

	#[test]
	fn timeliness_saturates() {
		let mut metrics = MetricsAggregator::new();
		let issuer = Ip::new(0x30);
		metrics.record_prefetch_issued(issuer);
		metrics.record_prefetch_issued(issuer);
		metrics.record_resolution(&resolution(issuer, u64::MAX, Classification::Useful));
		metrics.record_resolution(&resolution(issuer, u64::MAX, Classification::Useful));

		let stats = metrics.prefetch(issuer).unwrap();
		assert_eq!(stats.useful, 2);
		assert_eq!(stats.timeliness_sum, u64::MAX);
		assert_eq!(stats.avg_timeliness(), u64::MAX as f64 / 2.0);
	}

	#[test]
	fn tables_are_sorted() {
		let mut metrics = MetricsAggregator::new();
		for (origin, misses) in [(3, 1), (1, 2), (2, 2), (4, 0)] {
			for _ in 0..misses {
				metrics.record_demand(Ip::new(origin), Some(Outcome::Miss));
			}
			metrics.record_demand(Ip::new(origin), Some(Outcome::Hit));
			for _ in 0..origin {
				metrics.record_prefetch_issued(Ip::new(10 - origin));
			}
		}

		let demand_origins = metrics
			.demand_table()
			.into_iter()
			.map(|(origin, _)| origin.to_u64())
			.collect::<Vec<_>>();
		assert_eq!(demand_origins, vec![1, 2, 3, 4]);

		let prefetch_issuers = metrics
			.prefetch_table()
			.into_iter()
			.map(|(issuer, _)| issuer.to_u64())
			.collect::<Vec<_>>();
		assert_eq!(prefetch_issuers, vec![6, 7, 8, 9]);
	}
}
