//! Logger
//!
//! Logs to stderr, filtered by `RUST_LOG`, and optionally to a file,
//! filtered by `RUST_LOG_FILE`.

// Imports
use {
	std::{
		fs,
		io,
		path::Path,
		sync::{Mutex, PoisonError},
	},
	tracing::metadata::LevelFilter,
	tracing_subscriber::{prelude::*, EnvFilter},
};

/// Environment variable for the file log filter
pub const LOG_FILE_ENV: &str = "RUST_LOG_FILE";

/// Initializes the logger.
///
/// Any messages logged through [`pre_init`] are emitted right after the
/// subscriber is installed.
pub fn init(log_file: Option<&Path>, log_file_append: bool) {
	let term_filter = EnvFilter::builder()
		.with_default_directive(LevelFilter::INFO.into())
		.from_env_lossy();
	let term_layer = tracing_subscriber::fmt::layer()
		.with_writer(io::stderr)
		.with_filter(term_filter);

	let file_layer = log_file
		.and_then(|path| {
			let file = fs::OpenOptions::new()
				.create(true)
				.write(true)
				.append(log_file_append)
				.truncate(!log_file_append)
				.open(path);
			match file {
				Ok(file) => Some(file),
				// Note: We can't log yet, so buffer it until the subscriber is installed
				Err(err) => {
					pre_init::warn(format!(
						"Unable to open log file {}, logging to stderr only: {err}",
						path.display()
					));
					None
				},
			}
		})
		.map(|file| {
			let file_filter = EnvFilter::builder()
				.with_env_var(LOG_FILE_ENV)
				.with_default_directive(LevelFilter::DEBUG.into())
				.from_env_lossy();
			tracing_subscriber::fmt::layer()
				.with_ansi(false)
				.with_writer(Mutex::new(file))
				.with_filter(file_filter)
		});

	if let Err(err) = tracing_subscriber::registry().with(term_layer).with(file_layer).try_init() {
		eprintln!("Unable to initialize logger: {err}");
		return;
	}

	pre_init::flush();
}

/// Messages logged before the logger is initialized
pub mod pre_init {
	// Imports
	use super::*;

	/// Level of a buffered message
	#[derive(Clone, Copy, Debug)]
	enum Level {
		Debug,
		Warn,
	}

	/// All buffered messages
	static MESSAGES: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());

	fn push(level: Level, msg: String) {
		MESSAGES
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.push((level, msg));
	}

	/// Buffers a debug message
	pub fn debug(msg: impl Into<String>) {
		self::push(Level::Debug, msg.into());
	}

	/// Buffers a warning
	pub fn warn(msg: impl Into<String>) {
		self::push(Level::Warn, msg.into());
	}

	/// Emits all buffered messages
	pub(super) fn flush() {
		let messages = std::mem::take(&mut *MESSAGES.lock().unwrap_or_else(PoisonError::into_inner));
		for (level, msg) in messages {
			match level {
				Level::Debug => tracing::debug!("{msg}"),
				Level::Warn => tracing::warn!("{msg}"),
			}
		}
	}

}
