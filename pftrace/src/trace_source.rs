//! Trace sources.
//!
//! Decodes a (possibly gzip-compressed) trace into a lazy sequence of
//! [`AccessEvent`]s. Malformed records are skipped and counted, they never
//! reach the caller.

// Modules
pub mod champsim;
pub mod text;

// Exports
pub use self::champsim::{BinaryArch, InstrRecord};

// Imports
use {
	crate::event::{AccessEvent, Ip, LineAddr},
	anyhow::Context,
	flate2::read::MultiGzDecoder,
	pftrace_util::ReadFull,
	std::{
		collections::{BTreeMap, VecDeque},
		fs,
		io::{self, BufRead, BufReader},
		path::Path,
	},
};

/// Trace format
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceFormat {
	/// Delimited text, one access per line
	Text,

	/// Fixed-width binary instruction records
	Binary(BinaryArch),
}

/// Trace source configuration
#[derive(Clone, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TraceSourceConfig {
	/// Format
	pub format: TraceFormat,

	/// Number of leading records to skip
	pub skip: u64,

	/// Maximum number of records to decode.
	///
	/// A limit of `0` is the same as no limit.
	pub limit: Option<u64>,

	/// Cache line granularity exponent (6 = 64-byte lines)
	pub block_bits: u32,

	/// Whether the first line of a text trace is a header
	pub text_header: bool,
}

impl Default for TraceSourceConfig {
	fn default() -> Self {
		Self {
			format:      TraceFormat::Text,
			skip:        0,
			limit:       None,
			block_bits:  LineAddr::DEFAULT_BLOCK_BITS,
			text_header: true,
		}
	}
}

/// Trace source statistics
#[derive(PartialEq, Eq, Clone, Default, Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[derive(bincode::Encode, bincode::Decode)]
pub struct SourceStats {
	/// Records skipped due to the configured skip
	pub records_skipped: u64,

	/// Records decoded
	pub records_decoded: u64,

	/// Malformed records
	pub records_malformed: u64,

	/// Events emitted
	pub events_emitted: u64,

	/// Binary records, by number of read addresses
	pub accesses_per_record: BTreeMap<u64, u64>,
}

/// Trace source
#[derive(Debug)]
pub struct TraceSource<R> {
	/// Reader
	reader: R,

	/// Config
	config: TraceSourceConfig,

	/// Index of the next well-formed record, including skipped ones
	record_idx: u64,

	/// Whether we still need to consume the text header
	header_pending: bool,

	/// Events decoded, but not yet yielded
	pending: VecDeque<AccessEvent>,

	/// Line buffer for text traces
	line: String,

	/// Whether the reader is exhausted
	finished: bool,

	/// Statistics
	stats: SourceStats,
}

impl TraceSource<Box<dyn BufRead>> {
	/// Opens a trace file.
	///
	/// Files ending in `.gz` are decompressed on the fly.
	pub fn open(path: &Path, config: TraceSourceConfig) -> Result<Self, anyhow::Error> {
		let file = fs::File::open(path).with_context(|| format!("Unable to open trace file {path:?}"))?;
		let reader: Box<dyn BufRead> = match path.extension().is_some_and(|ext| ext == "gz") {
			true => {
				tracing::debug!(?path, "Opening gzip-compressed trace");
				Box::new(BufReader::new(MultiGzDecoder::new(file)))
			},
			false => Box::new(BufReader::new(file)),
		};

		Ok(Self::from_reader(reader, config))
	}
}

impl<R: BufRead> TraceSource<R> {
	/// Creates a trace source from a reader
	pub fn from_reader(reader: R, config: TraceSourceConfig) -> Self {
		Self {
			reader,
			header_pending: config.format == TraceFormat::Text && config.text_header,
			config,
			record_idx: 0,
			pending: VecDeque::new(),
			line: String::new(),
			finished: false,
			stats: SourceStats::default(),
		}
	}

	/// Returns the statistics so far
	pub fn stats(&self) -> &SourceStats {
		&self.stats
	}

	/// Returns if we've decoded all records we're allowed to
	fn limit_reached(&self) -> bool {
		self.config
			.limit
			.is_some_and(|limit| limit != 0 && self.stats.records_decoded >= limit)
	}

	/// Returns if the next well-formed record should be skipped, counting it if so
	fn skip_record(&mut self) -> bool {
		let skip = self.record_idx < self.config.skip;
		if skip {
			self.stats.records_skipped += 1;
		}
		self.record_idx += 1;
		skip
	}

	/// Reads the next raw record, queueing any events decoded from it.
	///
	/// Returns `false` once the reader is exhausted.
	fn read_record(&mut self) -> bool {
		match self.config.format {
			TraceFormat::Text => self.read_text_record(),
			TraceFormat::Binary(arch) => self.read_binary_record(arch),
		}
	}

	fn read_text_record(&mut self) -> bool {
		// Note: We take the buffer out so the line may be borrowed while we update ourselves
		let mut line = std::mem::take(&mut self.line);
		line.clear();
		let more = match self.reader.read_line(&mut line) {
			Ok(0) => false,
			Ok(_) => {
				self.handle_text_line(line.trim_end_matches(['\n', '\r']));
				true
			},
			// Note: The invalid line has already been consumed by the reader
			Err(err) if err.kind() == io::ErrorKind::InvalidData => {
				match std::mem::take(&mut self.header_pending) {
					true => tracing::trace!(?err, "Skipping non-utf8 header"),
					false => {
						tracing::trace!(?err, "Skipping non-utf8 line");
						self.stats.records_malformed += 1;
					},
				}
				true
			},
			Err(err) => {
				tracing::warn!(?err, "Unable to read trace, stopping early");
				self.stats.records_malformed += 1;
				false
			},
		};
		self.line = line;

		more
	}

	fn handle_text_line(&mut self, line: &str) {
		if std::mem::take(&mut self.header_pending) {
			tracing::trace!(?line, "Skipping header");
			return;
		}
		if line.trim().is_empty() {
			return;
		}

		let Some(fields) = text::Fields::split(line) else {
			tracing::trace!(?line, "Skipping record with too few fields");
			self.stats.records_malformed += 1;
			return;
		};

		if self.skip_record() {
			return;
		}

		match fields.decode(self.config.block_bits) {
			Ok(event) => {
				self.pending.push_back(event);
				self.stats.records_decoded += 1;
			},
			Err(err) => {
				tracing::trace!(?line, ?err, "Skipping malformed record");
				self.stats.records_malformed += 1;
			},
		}
	}

	fn read_binary_record(&mut self, arch: BinaryArch) -> bool {
		let mut buf = [0; BinaryArch::MAX_RECORD_SIZE];
		let buf = &mut buf[..arch.record_size()];
		match self.reader.read_full(buf) {
			Ok(0) => return false,
			Ok(len) if len < buf.len() => {
				tracing::trace!(len, expected = buf.len(), "Found truncated record at end of trace");
				self.stats.records_malformed += 1;
				return false;
			},
			Ok(_) => (),
			Err(err) => {
				tracing::warn!(?err, "Unable to read trace, stopping early");
				self.stats.records_malformed += 1;
				return false;
			},
		}

		let cycle = self.record_idx;
		if self.skip_record() {
			return true;
		}

		let record = match InstrRecord::from_bytes(arch, buf) {
			Ok(record) => record,
			Err(err) => {
				tracing::trace!(?err, "Skipping malformed record");
				self.stats.records_malformed += 1;
				return true;
			},
		};

		let origin = Ip::new(record.ip);
		let block_bits = self.config.block_bits;
		let events_before = self.pending.len();
		self.pending.extend(
			record
				.read_addrs()
				.map(|addr| AccessEvent::load(cycle, origin, LineAddr::from_byte_addr(addr, block_bits), None)),
		);

		let accesses = (self.pending.len() - events_before) as u64;
		*self.stats.accesses_per_record.entry(accesses).or_default() += 1;
		self.stats.records_decoded += 1;

		true
	}
}

impl<R: BufRead> Iterator for TraceSource<R> {
	type Item = AccessEvent;

	fn next(&mut self) -> Option<Self::Item> {
		loop {
			if let Some(event) = self.pending.pop_front() {
				self.stats.events_emitted += 1;
				return Some(event);
			}

			if self.finished || self.limit_reached() {
				self.finished = true;
				return None;
			}

			if !self.read_record() {
				self.finished = true;
			}
		}
	}
}
