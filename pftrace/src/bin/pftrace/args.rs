//! Arguments

// Imports
use {
	pftrace::{trace_source::BinaryArch, TraceFormat},
	std::path::PathBuf,
};

/// Arguments
#[derive(Debug)]
#[derive(clap::Parser)]
pub struct Args {
	/// Log file
	///
	/// Specifies a file to perform verbose logging to.
	/// You can use `RUST_LOG_FILE` to set filtering options
	#[clap(long = "log-file")]
	pub log_file: Option<PathBuf>,

	/// Whether to append to the log file
	#[clap(long = "log-file-append")]
	pub log_file_append: bool,

	/// Trace file
	///
	/// Files ending in `.gz` are decompressed.
	pub trace_file: PathBuf,

	/// Config file
	#[clap(long = "config")]
	pub config_file: Option<PathBuf>,

	/// Trace format.
	///
	/// Overrides the config file.
	#[clap(short = 'f', long = "format", value_enum)]
	pub format: Option<FormatArg>,

	/// Records to skip.
	///
	/// Overrides the config file.
	#[clap(short = 's', long = "skip")]
	pub skip: Option<u64>,

	/// Records to analyze, or `0` for all of them.
	///
	/// Overrides the config file.
	#[clap(short = 'r', long = "run")]
	pub run: Option<u64>,

	/// Output file
	#[clap(short = 'o', long = "output")]
	pub output_file: Option<PathBuf>,

	/// Output format
	#[clap(long = "output-format", value_enum, default_value_t = OutputFormat::Json)]
	pub output_format: OutputFormat,
}

/// Trace format argument
#[derive(Clone, Copy, Debug)]
#[derive(clap::ValueEnum)]
pub enum FormatArg {
	/// Delimited text
	Text,

	/// Binary, standard layout
	Standard,

	/// Binary, cloudsuite layout
	Cloudsuite,
}

impl From<FormatArg> for TraceFormat {
	fn from(format: FormatArg) -> Self {
		match format {
			FormatArg::Text => Self::Text,
			FormatArg::Standard => Self::Binary(BinaryArch::Standard),
			FormatArg::Cloudsuite => Self::Binary(BinaryArch::CloudSuite),
		}
	}
}

/// Output format
#[derive(Clone, Copy, Debug)]
#[derive(clap::ValueEnum)]
pub enum OutputFormat {
	Json,
	Bincode,
}
