extern crate wishrec;

use wishrec::cli::{exit_with_usage, print_json, Positional, UsageError};
use wishrec::config::AppConfig;
use wishrec::io::{CsvRepository, UserId};
use wishrec::{init_thread_pool, load_or_train, logging, Recommender};

const USAGE: &str = "recommend <user_id> [count]";

fn parse_args(args: &Positional) -> Result<(UserId, Option<usize>), UsageError> {
    args.at_most(2)?;
    let user_id = args.required(0, "user_id")?;
    let count = args.optional(1, "count")?;
    Ok((user_id, count))
}

fn main() -> anyhow::Result<()> {
    let (user_id, count) = match parse_args(&Positional::from_env()) {
        Ok(parsed) => parsed,
        Err(error) => exit_with_usage(USAGE, &error),
    };

    let config = AppConfig::from_env()?;
    logging::init(&config.log.level);
    init_thread_pool(config.model.num_threads);

    let repository = CsvRepository::new(&config.data.directory);
    let state = load_or_train(&repository, &config.model.snapshot_path)?;

    let recommender = Recommender::new(&state, config.recommender_settings()?);
    let how_many = count.unwrap_or(config.model.num_items_to_recommend);
    let product_ids = recommender.recommend(user_id, how_many);

    print_json(&product_ids)
}
