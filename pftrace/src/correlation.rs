//! Prefetch correlation table
//!
//! Matches each prefetch with the next demand access to the same line.
//! Each line is either absent from the table or has exactly one pending
//! prefetch. A later prefetch to a pending line replaces the earlier one,
//! and a demand access always consumes the pending entry, so a prefetch is
//! credited at most once.
//!
//! Entries that are never consumed stay until the end of the trace, so the
//! table's size is bounded by the number of distinct unresolved lines.

// Imports
use {
	crate::event::{Ip, LineAddr, Outcome},
	std::collections::HashMap,
};

/// Prefetch correlation table
#[derive(Clone, Default, Debug)]
pub struct PrefetchCorrelationTable {
	/// Pending prefetches, by line
	pending: HashMap<LineAddr, PendingPrefetch>,
}

impl PrefetchCorrelationTable {
	/// Creates an empty table
	pub fn new() -> Self {
		Self {
			pending: HashMap::new(),
		}
	}

	/// Registers a prefetch of `line`, replacing any pending one.
	pub fn on_prefetch(&mut self, line: LineAddr, issuer: Ip, cycle: u64) {
		let prefetch = PendingPrefetch {
			issue_cycle: cycle,
			issuer,
		};
		if let Some(prev) = self.pending.insert(line, prefetch) {
			tracing::trace!(?line, ?prev, ?prefetch, "Overwrote pending prefetch");
		}
	}

	/// Registers a demand access to `line`, consuming its pending prefetch, if any.
	///
	/// The prefetch is useful if the access hit and late otherwise.
	pub fn on_demand(&mut self, line: LineAddr, cycle: u64, outcome: Option<Outcome>) -> Option<Resolution> {
		let prefetch = self.pending.remove(&line)?;
		let classification = match outcome {
			Some(Outcome::Hit) => Classification::Useful,
			Some(Outcome::Miss) | None => Classification::Late,
		};

		Some(Resolution {
			issuer: prefetch.issuer,
			issue_cycle: prefetch.issue_cycle,
			ahead: cycle.saturating_sub(prefetch.issue_cycle),
			classification,
		})
	}

	/// Returns the pending prefetch of `line`, if any
	pub fn pending(&self, line: LineAddr) -> Option<&PendingPrefetch> {
		self.pending.get(&line)
	}

	/// Returns if `line` has a pending prefetch
	pub fn is_pending(&self, line: LineAddr) -> bool {
		self.pending.contains_key(&line)
	}

	/// Returns the number of pending prefetches
	pub fn pending_len(&self) -> usize {
		self.pending.len()
	}
}

/// A prefetch not yet matched with a demand access
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct PendingPrefetch {
	/// Cycle the prefetch was issued
	pub issue_cycle: u64,

	/// Issuer
	pub issuer: Ip,
}

/// Resolution of a pending prefetch by a demand access
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Resolution {
	/// Issuer of the prefetch
	pub issuer: Ip,

	/// Cycle the prefetch was issued
	pub issue_cycle: u64,

	/// Cycles between the prefetch and the demand access
	pub ahead: u64,

	/// Classification
	pub classification: Classification,
}

/// Prefetch classification
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Classification {
	/// The demand access hit
	Useful,

	/// The demand access still missed.
	///
	/// The address was right, but we don't model whether the prefetch was
	/// still in flight.
	Late,
}
