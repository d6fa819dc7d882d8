extern crate wishrec;

use wishrec::config::AppConfig;
use wishrec::io::CsvRepository;
use wishrec::{init_thread_pool, logging, snapshot, train_from};

fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    logging::init(&config.log.level);
    init_thread_pool(config.model.num_threads);

    let repository = CsvRepository::new(&config.data.directory);
    let state = train_from(&repository)?;
    snapshot::save_to_path(&state, &config.model.snapshot_path)?;

    println!("{}", state.stats());
    Ok(())
}
