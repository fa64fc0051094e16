//! Access events

// Imports
use std::fmt;

/// Instruction pointer that originated an event.
///
/// [`Ip::NONE`] is reserved for events with no attributable instruction,
/// such as those issued by a hardware prefetcher.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(bincode::Encode, bincode::Decode)]
pub struct Ip(u64);

impl Ip {
	/// No attributable instruction
	pub const NONE: Self = Self(0);

	/// Creates an instruction pointer from a `u64`
	pub const fn new(ip: u64) -> Self {
		Self(ip)
	}

	/// Returns the instruction pointer as a `u64`
	pub const fn to_u64(self) -> u64 {
		self.0
	}

	/// Returns if this is the [`Ip::NONE`] sentinel
	pub const fn is_none(self) -> bool {
		self.0 == Self::NONE.0
	}
}

impl fmt::Debug for Ip {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.is_none() {
			true => f.write_str("Ip(HW)"),
			false => f.debug_tuple("Ip").field(&format_args!("{:#x}", self.0)).finish(),
		}
	}
}

/// Cache line address.
///
/// Two addresses within the same cache line map to the same value.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(bincode::Encode, bincode::Decode)]
pub struct LineAddr(u64);

impl fmt::Debug for LineAddr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("LineAddr")
			.field(&format_args!("{:#010x}", self.0))
			.finish()
	}
}

impl LineAddr {
	/// Default block granularity exponent (64-byte lines)
	pub const DEFAULT_BLOCK_BITS: u32 = 6;

	/// Creates a line address from an already block-shifted value
	pub const fn new(line: u64) -> Self {
		Self(line)
	}

	/// Creates a line address from a byte address, dropping the low `block_bits` bits.
	pub const fn from_byte_addr(addr: u64, block_bits: u32) -> Self {
		match block_bits {
			64.. => Self(0),
			_ => Self(addr >> block_bits),
		}
	}

	/// Returns the line address as a `u64`
	pub const fn to_u64(self) -> u64 {
		self.0
	}

	/// Returns the signed distance, in lines, from `prev` to this line
	pub const fn delta_from(self, prev: Self) -> i64 {
		self.0.wrapping_sub(prev.0) as i64
	}
}

/// Access kind
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum AccessKind {
	/// Demand load
	Load,

	/// Hardware or software prefetch
	Prefetch,

	/// Anything else (stores, translations, ...).
	///
	/// Not processed by the analysis.
	Other,
}

impl AccessKind {
	/// Classifies an operation string from a text trace.
	///
	/// Prefetch takes priority, since some simulators label prefetches as
	/// e.g. `LOAD_PREFETCH`.
	pub fn from_op_str(op: &str) -> Self {
		if op.contains("PREFETCH") {
			Self::Prefetch
		} else if op.contains("LOAD") {
			Self::Load
		} else {
			Self::Other
		}
	}
}

/// Access outcome
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Outcome {
	Hit,
	Miss,
}

impl Outcome {
	/// Parses an outcome string from a text trace.
	///
	/// Returns `None` for anything other than exactly `HIT` or `MISS`.
	pub fn from_result_str(result: &str) -> Option<Self> {
		match result {
			"HIT" => Some(Self::Hit),
			"MISS" => Some(Self::Miss),
			_ => None,
		}
	}
}

/// An access event
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct AccessEvent {
	/// Simulation cycle
	pub cycle: u64,

	/// Originating instruction
	pub origin: Ip,

	/// Cache line accessed
	pub line: LineAddr,

	/// Access kind
	pub kind: AccessKind,

	/// Outcome, if the trace recorded one.
	///
	/// Only meaningful for [`AccessKind::Load`].
	pub outcome: Option<Outcome>,
}

impl AccessEvent {
	/// Creates a demand load event
	pub const fn load(cycle: u64, origin: Ip, line: LineAddr, outcome: Option<Outcome>) -> Self {
		Self {
			cycle,
			origin,
			line,
			kind: AccessKind::Load,
			outcome,
		}
	}

	/// Creates a prefetch event
	pub const fn prefetch(cycle: u64, origin: Ip, line: LineAddr) -> Self {
		Self {
			cycle,
			origin,
			line,
			kind: AccessKind::Prefetch,
			outcome: None,
		}
	}
}
