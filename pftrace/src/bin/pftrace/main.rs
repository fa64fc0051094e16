//! Prefetch trace analyzer (`pftrace`)

// Modules
mod args;
mod config;

// Imports
use {
	self::args::{Args, OutputFormat},
	anyhow::Context,
	clap::Parser,
	pftrace::{AnalysisEngine, EngineConfig, TraceSource},
	pftrace_util::{logger, DisplayWrapper},
	std::{
		fs,
		io::{self, Write},
		time::Duration,
	},
};

fn main() -> Result<(), anyhow::Error> {
	// Get arguments
	let args = Args::parse();
	logger::pre_init::debug(format!("Args: {args:?}"));

	// Initialize logging
	logger::init(args.log_file.as_deref(), args.log_file_append);

	// Read the config file, if any, and apply any overrides
	let mut config = match &args.config_file {
		Some(config_path) => {
			let config_file = fs::File::open(config_path).context("Unable to open config file")?;
			serde_json::from_reader::<_, self::config::Config>(io::BufReader::new(config_file))
				.context("Unable to parse config file")?
		},
		None => self::config::Config::default(),
	};
	if let Some(format) = args.format {
		config.trace.format = format.into();
	}
	if let Some(skip) = args.skip {
		config.trace.skip = skip;
	}
	if let Some(run) = args.run {
		config.trace.limit = Some(run);
	}
	tracing::debug!(?config, "Using config");

	// Open the trace file
	let mut trace_source =
		TraceSource::open(&args.trace_file, config.trace.clone()).context("Unable to open trace source")?;

	// Run the engine
	let mut engine = AnalysisEngine::new(EngineConfig {
		history_limit:       config.history_limit,
		debug_output_period: Duration::try_from_secs_f64(config.debug_output_period_secs)
			.context("Invalid debug output period")?,
	});
	let run_output = engine.run(trace_source.by_ref());

	let source_stats = trace_source.stats();
	if source_stats.records_malformed > 0 {
		tracing::warn!(
			records_malformed = source_stats.records_malformed,
			"Skipped malformed records"
		);
	}
	tracing::info!(
		records_decoded = source_stats.records_decoded,
		events_processed = run_output.events_processed,
		cycle_span = ?run_output.cycle_span,
		"Finished: {}",
		DisplayWrapper::new(|f| engine.fmt_debug(f))
	);

	if let Some(output_path) = &args.output_file {
		let snapshot = engine.snapshot(
			&run_output,
			source_stats,
			config.stride_top_k,
			config.history_dump_origins,
			config.history_dump_len,
		);

		let output_file = fs::File::create(output_path).context("Unable to create output file")?;
		let mut output_file = io::BufWriter::new(output_file);
		match args.output_format {
			OutputFormat::Json =>
				serde_json::to_writer(&mut output_file, &snapshot).context("Unable to write to output file")?,
			OutputFormat::Bincode => {
				bincode::encode_into_std_write(&snapshot, &mut output_file, bincode::config::standard())
					.context("Unable to write to output file")?;
			},
		}
		output_file.flush().context("Unable to flush output file")?;
	}

	Ok(())
}
