use std::{fs::File, io::BufReader, process::ExitCode, time::Instant};

use dhp_rule_miner::{
    cache,
    config::{usage, RunConfig, LOG_ENV},
    ingest::{read_rows, support_count_from_percent, to_transactions},
    mine,
    report::Report,
    MinerResult, MiningParams, MiningSnapshot,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let cfg = match RunConfig::load() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("[error] {err}");
            eprintln!("{}", usage());
            return ExitCode::FAILURE;
        }
    };
    if cfg.help {
        println!("{}", usage());
        return ExitCode::SUCCESS;
    }
    match run(&cfg) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("[error] {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cfg: &RunConfig) -> MinerResult<()> {
    let Some(input) = &cfg.input else {
        // no new data: show what the last run left behind
        match cache::load::<String>(&cfg.cache_file)? {
            Some(snapshot) => print_snapshot(cfg, &snapshot),
            None => println!(
                "No cached result at {}. Pass --input FILE to mine.",
                cfg.cache_file.display()
            ),
        }
        return Ok(());
    };

    let start = Instant::now();
    let rows = read_rows(BufReader::new(File::open(input)?))?;
    let transactions = to_transactions(rows, &cfg.ingest);
    info!(
        path = %input.display(),
        transactions = transactions.len(),
        load_ms = start.elapsed().as_secs_f64() * 1000.0,
        "transactions loaded"
    );
    if transactions.is_empty() {
        warn!("no transactions left after filtering");
    }

    let min_support = support_count_from_percent(cfg.min_support_percent, transactions.len());
    let params = MiningParams::new(min_support, cfg.min_confidence())?.with_parallel(cfg.parallel);
    let result = mine(transactions, &params)?;

    let snapshot = MiningSnapshot::new(result)
        .with_percents(cfg.min_support_percent, cfg.min_confidence_percent);
    cache::save(&cfg.cache_file, &snapshot)?;
    print_snapshot(cfg, &snapshot);
    Ok(())
}

fn print_snapshot(cfg: &RunConfig, snapshot: &MiningSnapshot<String>) {
    if let (Some(support), Some(confidence)) =
        (snapshot.min_support_percent, snapshot.min_confidence_percent)
    {
        println!(
            "Mined {} with min support {support}% and min confidence {confidence}%",
            snapshot.created_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    print!("{}", Report::new(&snapshot.result).top(cfg.top));
}
