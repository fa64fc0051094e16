//! Full pipeline tests, from trace files to snapshots

// Imports
use {
	flate2::{write::GzEncoder, Compression},
	pftrace::{
		data::Snapshot,
		trace_source::{BinaryArch, InstrRecord},
		AnalysisEngine,
		Ip,
		TraceFormat,
		TraceSource,
		TraceSourceConfig,
	},
	std::{fs, io::Write, path::Path},
};

const HEADER: &str = "Cycle,IP,Address,Type,Result\n";

/// Runs the engine over the trace at `path`
fn analyze(path: &Path, config: TraceSourceConfig) -> (AnalysisEngine, String) {
	let mut source = TraceSource::open(path, config).expect("Unable to open trace");
	let mut engine = AnalysisEngine::default();
	let output = engine.run(source.by_ref());
	let snapshot = engine.snapshot(&output, source.stats(), 4, 10, 100);
	let json = serde_json::to_string(&snapshot).expect("Unable to serialize snapshot");
	(engine, json)
}

/// Generates a deterministic pseudo-random text trace
fn random_trace(len: u64) -> String {
	let mut state = 0x2545_f491_4f6c_dd1d_u64;
	let mut trace = String::from(HEADER);
	for cycle in 0..len {
		state ^= state << 13;
		state ^= state >> 7;
		state ^= state << 17;

		let ip = match state % 5 {
			0 => 0,
			ip => 0x400000 + ip * 4,
		};
		let addr = (state >> 8) % 64 * 64 + (state >> 40) % 64;
		let op = match (state >> 20) % 4 {
			0 => "PREFETCH",
			1 => "RFO",
			_ => "LOAD",
		};
		let result = match (state >> 30) % 2 {
			0 => "HIT",
			_ => "MISS",
		};
		trace.push_str(&format!("{cycle},{ip:#x},{addr:#x},{op},{result}\n"));
	}

	trace
}

#[test]
fn scenarios() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("trace.csv");
	let trace = [
		HEADER,
		// Useful prefetch, issued 5 cycles ahead
		"10,0xa,0x140,PREFETCH,MISS\n",
		"15,0xc,0x150,LOAD,HIT\n",
		// Late prefetch
		"20,0xa,0x1c0,PREFETCH,MISS\n",
		"22,0xc,0x1c0,LOAD,MISS\n",
		// Lone load
		"30,0xd,0x1f00,LOAD,MISS\n",
		// Two prefetches to the same line, only the last one is credited
		"40,0xa,0x240,PREFETCH,HIT\n",
		"41,0xb,0x240,PREFETCH,HIT\n",
		"43,0xc,0x240,LOAD,HIT\n",
		// Never consumed
		"50,0,0x8000,PREFETCH,MISS\n",
	]
	.concat();
	fs::write(&path, trace).unwrap();

	let (engine, _) = analyze(&path, TraceSourceConfig::default());
	let totals = engine.totals();
	assert_eq!(totals.load_access, 4);
	assert_eq!(totals.load_miss, 2);
	assert_eq!(totals.pf_issued, 5);
	assert_eq!(totals.pf_useful, 2);
	assert_eq!(totals.pf_late, 1);
	assert_eq!(totals.pf_useless(), 2);

	let metrics = engine.metrics();
	let a = metrics.prefetch(Ip::new(0xa)).unwrap();
	assert_eq!((a.issued, a.useful, a.late, a.useless()), (3, 1, 1, 1));
	assert_eq!(a.timeliness_sum, 5);
	let b = metrics.prefetch(Ip::new(0xb)).unwrap();
	assert_eq!((b.issued, b.useful, b.timeliness_sum), (1, 1, 2));
	assert_eq!(metrics.prefetch(Ip::NONE).unwrap().useless(), 1);

	let demand_origins = engine
		.demand_table()
		.into_iter()
		.map(|(origin, _)| origin)
		.collect::<Vec<_>>();
	assert_eq!(demand_origins, vec![Ip::new(0xc), Ip::new(0xd)]);
	assert_eq!(engine.pending_prefetches(), 1);
}

#[test]
fn compressed_and_plain_match() {
	let dir = tempfile::tempdir().unwrap();
	let trace = random_trace(5000);

	let plain_path = dir.path().join("trace.csv");
	fs::write(&plain_path, &trace).unwrap();

	let gz_path = dir.path().join("trace.csv.gz");
	let mut encoder = GzEncoder::new(fs::File::create(&gz_path).unwrap(), Compression::default());
	encoder.write_all(trace.as_bytes()).unwrap();
	encoder.finish().unwrap();

	let (_, plain) = analyze(&plain_path, TraceSourceConfig::default());
	let (_, compressed) = analyze(&gz_path, TraceSourceConfig::default());
	let (_, plain_again) = analyze(&plain_path, TraceSourceConfig::default());
	assert_eq!(plain, compressed);
	assert_eq!(plain, plain_again);
}

#[test]
fn snapshot_bincode_round_trip() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("trace.csv");
	fs::write(&path, random_trace(2000)).unwrap();

	let mut source = TraceSource::open(&path, TraceSourceConfig::default()).unwrap();
	let mut engine = AnalysisEngine::default();
	let output = engine.run(source.by_ref());
	let snapshot = engine.snapshot(&output, source.stats(), 4, 10, 100);
	assert!(!snapshot.demand.is_empty());
	assert!(!snapshot.prefetch.is_empty());

	let bytes = bincode::encode_to_vec(&snapshot, bincode::config::standard()).unwrap();
	let (decoded, len) = bincode::decode_from_slice::<Snapshot, _>(&bytes, bincode::config::standard()).unwrap();
	assert_eq!(len, bytes.len());
	assert_eq!(decoded.totals, snapshot.totals);
	assert_eq!(decoded.demand, snapshot.demand);
	assert_eq!(decoded.prefetch, snapshot.prefetch);
	assert_eq!(decoded, snapshot);
}

#[test]
fn invariants_hold() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("trace.csv");
	fs::write(&path, random_trace(20_000)).unwrap();

	let (engine, _) = analyze(&path, TraceSourceConfig::default());
	let totals = engine.totals();
	assert!(totals.pf_issued > 0);
	assert!(totals.pf_useful + totals.pf_late > 0);
	assert_eq!(totals.pf_useful + totals.pf_late + totals.pf_useless(), totals.pf_issued);

	for (_, stats) in engine.prefetch_table() {
		assert_eq!(stats.useful + stats.late + stats.useless(), stats.issued);
	}
	for (origin, stats) in engine.demand_table() {
		assert!(stats.misses <= stats.accesses);
		assert!((0.0..=100.0).contains(&stats.miss_rate()));
		assert!(engine.history().history(origin).len() <= engine.history().limit());
	}
}

#[test]
fn skip_and_run_limit() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("trace.csv");
	fs::write(&path, random_trace(100)).unwrap();

	let config = TraceSourceConfig {
		skip: 10,
		limit: Some(25),
		..TraceSourceConfig::default()
	};
	let mut source = TraceSource::open(&path, config).unwrap();
	let events = source.by_ref().collect::<Vec<_>>();
	assert_eq!(events.len(), 25);
	assert_eq!(events[0].cycle, 10);
	assert_eq!(source.stats().records_skipped, 10);
}

#[test]
fn missing_trace_is_an_error() {
	let dir = tempfile::tempdir().unwrap();
	let res = TraceSource::open(&dir.path().join("missing.csv.gz"), TraceSourceConfig::default());
	assert!(res.is_err());
}

#[test]
fn binary_trace_strides() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("trace.champsimtrace.gz");
	let arch = BinaryArch::Standard;

	let mut encoder = GzEncoder::new(fs::File::create(&path).unwrap(), Compression::default());
	for idx in 0..50 {
		// A unit-stride load, plus an instruction with no memory operands
		let mut record = InstrRecord::new(arch, 0x401000);
		record.src_mem[0] = 0x10_0000 + idx * 64;
		record.to_writer(&mut encoder).unwrap();
		InstrRecord::new(arch, 0x401004).to_writer(&mut encoder).unwrap();
	}
	encoder.finish().unwrap();

	let config = TraceSourceConfig {
		format: TraceFormat::Binary(arch),
		..TraceSourceConfig::default()
	};
	let mut source = TraceSource::open(&path, config).unwrap();
	let mut engine = AnalysisEngine::default();
	let output = engine.run(source.by_ref());
	assert_eq!(output.events_processed, 50);
	assert_eq!(source.stats().records_decoded, 100);
	assert_eq!(source.stats().accesses_per_record.get(&0), Some(&50));
	assert_eq!(source.stats().accesses_per_record.get(&1), Some(&50));

	let dist = engine.stride_distribution(Ip::new(0x401000), 1).unwrap();
	assert_eq!(dist.deltas_total, 49);
	assert_eq!(dist.strides[0].delta, 1);
	assert_eq!(dist.strides[0].fraction, 1.0);
	assert_eq!(engine.totals().load_miss, 0);
	assert_eq!(engine.totals().pf_issued, 0);
}
