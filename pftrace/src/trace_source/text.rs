//! Delimited-text traces.
//!
//! Each line holds `cycle, ip, address, operation, result`, e.g.
//! `1042,0x401a2c,0x7ffd3c40,LOAD,MISS`.

// Imports
use {
	crate::event::{AccessEvent, AccessKind, Ip, LineAddr, Outcome},
	anyhow::Context,
	itertools::Itertools,
};

/// Raw fields of a text record
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Fields<'a> {
	pub cycle:  &'a str,
	pub ip:     &'a str,
	pub addr:   &'a str,
	pub op:     &'a str,
	pub result: &'a str,
}

impl<'a> Fields<'a> {
	/// Splits a line into its fields.
	///
	/// Returns `None` if the line has too few fields. Any extra fields are ignored.
	pub fn split(line: &'a str) -> Option<Self> {
		let (cycle, ip, addr, op, result) = line.split(',').map(str::trim).next_tuple()?;
		Some(Self {
			cycle,
			ip,
			addr,
			op,
			result,
		})
	}

	/// Decodes these fields into an event
	pub fn decode(&self, block_bits: u32) -> Result<AccessEvent, anyhow::Error> {
		let cycle = self
			.cycle
			.parse::<u64>()
			.with_context(|| format!("Unable to parse cycle {:?}", self.cycle))?;
		let ip = self::parse_hex(self.ip).with_context(|| format!("Unable to parse ip {:?}", self.ip))?;
		let addr = self::parse_hex(self.addr).with_context(|| format!("Unable to parse address {:?}", self.addr))?;

		Ok(AccessEvent {
			cycle,
			origin: Ip::new(ip),
			line: LineAddr::from_byte_addr(addr, block_bits),
			kind: AccessKind::from_op_str(self.op),
			outcome: Outcome::from_result_str(self.result),
		})
	}
}

/// Parses a hexadecimal value, with an optional `0x` prefix
fn parse_hex(s: &str) -> Result<u64, std::num::ParseIntError> {
	let digits = s
		.strip_prefix("0x")
		.or_else(|| s.strip_prefix("0X"))
		.unwrap_or(s);
	u64::from_str_radix(digits, 16)
}
