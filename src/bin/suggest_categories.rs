extern crate wishrec;

use wishrec::cli::{exit_with_usage, print_json, Positional, UsageError};
use wishrec::config::AppConfig;
use wishrec::io::{CsvRepository, UserId};
use wishrec::{init_thread_pool, load_or_train, logging, Recommender};

const USAGE: &str = "suggest-categories <user_id>";

fn parse_args(args: &Positional) -> Result<UserId, UsageError> {
    args.at_most(1)?;
    args.required(0, "user_id")
}

fn main() -> anyhow::Result<()> {
    let user_id = match parse_args(&Positional::from_env()) {
        Ok(user_id) => user_id,
        Err(error) => exit_with_usage(USAGE, &error),
    };

    let config = AppConfig::from_env()?;
    logging::init(&config.log.level);
    init_thread_pool(config.model.num_threads);

    let repository = CsvRepository::new(&config.data.directory);
    let state = load_or_train(&repository, &config.model.snapshot_path)?;

    let recommender = Recommender::new(&state, config.recommender_settings()?);
    print_json(&recommender.suggested_categories(user_id))
}
