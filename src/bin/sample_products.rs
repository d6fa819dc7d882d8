extern crate wishrec;

use wishrec::cli::{exit_with_usage, print_json, Positional, UsageError};
use wishrec::config::AppConfig;
use wishrec::io::CsvRepository;
use wishrec::{init_thread_pool, load_or_train, logging};

const USAGE: &str = "sample-products [count] [seed]";
const DEFAULT_SAMPLE_SIZE: usize = 400;
const DEFAULT_SEED: u64 = 0;

fn parse_args(args: &Positional) -> Result<(usize, u64), UsageError> {
    args.at_most(2)?;
    let count = args.optional(0, "count")?.unwrap_or(DEFAULT_SAMPLE_SIZE);
    let seed = args.optional(1, "seed")?.unwrap_or(DEFAULT_SEED);
    Ok((count, seed))
}

fn main() -> anyhow::Result<()> {
    let (count, seed) = match parse_args(&Positional::from_env()) {
        Ok(parsed) => parsed,
        Err(error) => exit_with_usage(USAGE, &error),
    };

    let config = AppConfig::from_env()?;
    logging::init(&config.log.level);
    init_thread_pool(config.model.num_threads);

    let repository = CsvRepository::new(&config.data.directory);
    let state = load_or_train(&repository, &config.model.snapshot_path)?;

    print_json(&state.sample_products(count, seed))
}
