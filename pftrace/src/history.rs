//! Access history ledger

// Imports
use {
	crate::event::{Ip, LineAddr},
	itertools::Itertools,
	std::collections::HashMap,
};

/// Access history ledger.
///
/// Keeps, per origin, the first `limit` lines it loaded. Once full an
/// origin's history is never updated again, so it's a prefix sample of
/// the trace rather than a sliding window.
#[derive(Clone, Debug)]
pub struct AccessHistoryLedger {
	/// Maximum history length per origin
	limit: usize,

	/// History of each origin
	histories: HashMap<Ip, Vec<LineAddr>>,
}

impl AccessHistoryLedger {
	/// Default history limit
	pub const DEFAULT_LIMIT: usize = 1000;

	/// Creates an empty ledger
	pub fn new(limit: usize) -> Self {
		Self {
			limit,
			histories: HashMap::new(),
		}
	}

	/// Returns the history limit
	pub fn limit(&self) -> usize {
		self.limit
	}

	/// Records an access by `origin` to `line`
	pub fn record(&mut self, origin: Ip, line: LineAddr) {
		let history = self.histories.entry(origin).or_default();
		if history.len() < self.limit {
			history.push(line);
		}
	}

	/// Returns the history of `origin`, in arrival order
	pub fn history(&self, origin: Ip) -> &[LineAddr] {
		self.histories.get(&origin).map(Vec::as_slice).unwrap_or_default()
	}

	/// Returns all origins, by descending number of samples
	pub fn origins_by_samples(&self) -> Vec<(Ip, usize)> {
		self.histories
			.iter()
			.map(|(&origin, history)| (origin, history.len()))
			.sorted_unstable_by(|(lhs_origin, lhs_len), (rhs_origin, rhs_len)| {
				rhs_len.cmp(lhs_len).then(lhs_origin.cmp(rhs_origin))
			})
			.collect()
	}

	/// Returns the `top_k` most frequent strides of `origin`.
	///
	/// Returns `None` if there are less than 2 samples.
	pub fn stride_distribution(&self, origin: Ip, top_k: usize) -> Option<StrideDistribution> {
		let history = self.history(origin);
		if history.len() < 2 {
			return None;
		}

		let deltas_total = history.len() - 1;
		let strides = history
			.iter()
			.tuple_windows()
			.map(|(&prev, &cur)| cur.delta_from(prev))
			.counts()
			.into_iter()
			.sorted_unstable_by(|(lhs_delta, lhs_count), (rhs_delta, rhs_count)| {
				rhs_count.cmp(lhs_count).then(lhs_delta.cmp(rhs_delta))
			})
			.take(top_k)
			.map(|(delta, count)| StrideShare {
				delta,
				count,
				fraction: count as f64 / deltas_total as f64,
			})
			.collect();

		Some(StrideDistribution { deltas_total, strides })
	}
}

impl Default for AccessHistoryLedger {
	fn default() -> Self {
		Self::new(Self::DEFAULT_LIMIT)
	}
}

/// Stride distribution of an origin
#[derive(PartialEq, Clone, Debug)]
pub struct StrideDistribution {
	/// Total number of deltas in the history
	pub deltas_total: usize,

	/// Most frequent strides, by descending frequency
	pub strides: Vec<StrideShare>,
}

/// A single stride in a [`StrideDistribution`]
#[derive(PartialEq, Clone, Copy, Debug)]
pub struct StrideShare {
	/// Delta, in lines
	pub delta: i64,

	/// Number of occurrences
	pub count: usize,

	/// Fraction of all deltas (0..=1)
	pub fraction: f64,
}
