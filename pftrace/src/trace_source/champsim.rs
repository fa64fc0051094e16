//! Fixed-width binary instruction traces (`ChampSim` layout).
//!
//! Every record is a packed little-endian block:
//! `ip: u64, is_branch: u8, branch_taken: u8, dest_regs: [u8; D], src_regs: [u8; S],
//! dest_mem: [u64; D], src_mem: [u64; S]`, followed by a 2-byte ASID on `cloudsuite`.

// Imports
use {
	anyhow::Context,
	byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt},
	pftrace_util::ReadByteArray,
	std::io,
};

/// Binary trace architecture
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryArch {
	/// 2 destinations, 4 sources
	Standard,

	/// 4 destinations, 4 sources, plus an ASID
	#[serde(rename = "cloudsuite")]
	CloudSuite,
}

impl BinaryArch {
	/// Largest record size of any architecture
	pub const MAX_RECORD_SIZE: usize = Self::CloudSuite.record_size();
	/// Maximum number of operand slots of any architecture
	pub const MAX_SLOTS: usize = 4;

	/// Number of destination register/memory slots
	pub const fn dest_count(self) -> usize {
		match self {
			Self::Standard => 2,
			Self::CloudSuite => 4,
		}
	}

	/// Number of source register/memory slots
	pub const fn src_count(self) -> usize {
		4
	}

	/// ASID size
	pub const fn asid_size(self) -> usize {
		match self {
			Self::Standard => 0,
			Self::CloudSuite => 2,
		}
	}

	/// Size of each record
	pub const fn record_size(self) -> usize {
		let (dest, src) = (self.dest_count(), self.src_count());
		8 + 1 + 1 + dest + src + dest * 8 + src * 8 + self.asid_size()
	}
}

/// Instruction record
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct InstrRecord {
	/// Architecture
	// Note: Only the first `dest_count` / `src_count` slots of each array are in use.
	pub arch: BinaryArch,

	/// Instruction pointer
	pub ip: u64,

	// Branch info
	pub is_branch:    bool,
	pub branch_taken: bool,

	// Registers
	pub dest_regs: [u8; BinaryArch::MAX_SLOTS],
	pub src_regs:  [u8; BinaryArch::MAX_SLOTS],

	// Memory operands
	pub dest_mem: [u64; BinaryArch::MAX_SLOTS],
	pub src_mem:  [u64; BinaryArch::MAX_SLOTS],

	/// Address space id (`cloudsuite` only)
	pub asid: Option<[u8; 2]>,
}

impl InstrRecord {
	/// Creates an empty record
	pub const fn new(arch: BinaryArch, ip: u64) -> Self {
		Self {
			arch,
			ip,
			is_branch: false,
			branch_taken: false,
			dest_regs: [0; BinaryArch::MAX_SLOTS],
			src_regs: [0; BinaryArch::MAX_SLOTS],
			dest_mem: [0; BinaryArch::MAX_SLOTS],
			src_mem: [0; BinaryArch::MAX_SLOTS],
			asid: match arch {
				BinaryArch::Standard => None,
				BinaryArch::CloudSuite => Some([0; 2]),
			},
		}
	}

	/// Parses a record from exactly `arch.record_size()` bytes
	pub fn from_bytes(arch: BinaryArch, bytes: &[u8]) -> Result<Self, anyhow::Error> {
		anyhow::ensure!(
			bytes.len() == arch.record_size(),
			"Record had {} bytes, expected {}",
			bytes.len(),
			arch.record_size()
		);

		let reader = &mut &*bytes;
		let mut record = Self::new(arch, reader.read_u64::<LittleEndian>().context("Unable to read ip")?);
		record.is_branch = reader.read_u8().context("Unable to read branch flag")? != 0;
		record.branch_taken = reader.read_u8().context("Unable to read branch taken flag")? != 0;

		for reg in &mut record.dest_regs[..arch.dest_count()] {
			*reg = reader.read_u8().context("Unable to read destination register")?;
		}
		for reg in &mut record.src_regs[..arch.src_count()] {
			*reg = reader.read_u8().context("Unable to read source register")?;
		}
		for addr in &mut record.dest_mem[..arch.dest_count()] {
			*addr = reader
				.read_u64::<LittleEndian>()
				.context("Unable to read destination memory")?;
		}
		for addr in &mut record.src_mem[..arch.src_count()] {
			*addr = reader
				.read_u64::<LittleEndian>()
				.context("Unable to read source memory")?;
		}

		if arch.asid_size() != 0 {
			record.asid = Some(reader.read_byte_array().context("Unable to read asid")?);
		}

		Ok(record)
	}

	/// Writes this record to a writer
	pub fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<(), anyhow::Error> {
		let arch = self.arch;
		writer
			.write_u64::<LittleEndian>(self.ip)
			.context("Unable to write ip")?;
		writer
			.write_all(&[u8::from(self.is_branch), u8::from(self.branch_taken)])
			.context("Unable to write branch flags")?;
		writer
			.write_all(&self.dest_regs[..arch.dest_count()])
			.context("Unable to write destination registers")?;
		writer
			.write_all(&self.src_regs[..arch.src_count()])
			.context("Unable to write source registers")?;
		for &addr in self.dest_mem().iter().chain(self.src_mem()) {
			writer
				.write_u64::<LittleEndian>(addr)
				.context("Unable to write memory operand")?;
		}

		if arch.asid_size() != 0 {
			writer
				.write_all(&self.asid.unwrap_or_default())
				.context("Unable to write asid")?;
		}

		Ok(())
	}

	/// Returns the destination memory operands
	pub fn dest_mem(&self) -> &[u64] {
		&self.dest_mem[..self.arch.dest_count()]
	}

	/// Returns the source memory operands
	pub fn src_mem(&self) -> &[u64] {
		&self.src_mem[..self.arch.src_count()]
	}

	/// Returns all read addresses (non-zero source memory operands)
	pub fn read_addrs(&self) -> impl Iterator<Item = u64> + '_ {
		self.src_mem().iter().copied().filter(|&addr| addr != 0)
	}
}
