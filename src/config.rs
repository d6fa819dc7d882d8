use std::env;
use std::ffi::OsStr;
use std::fs::File;
use std::path::PathBuf;

use justconfig::item::ValueExtractor;
use justconfig::processors::Trim;
use justconfig::sources::env::Env;
use justconfig::sources::text::ConfigText;
use justconfig::ConfPath;
use justconfig::Config;

use crate::config_processors::Unquoted;
use crate::error::ConfigError;
use crate::recommenders::{
    BlendWeights, RecommenderSettings, DEFAULT_CANDIDATE_MULTIPLIER, DEFAULT_NUM_NEIGHBORS,
    DEFAULT_NUM_SIMILAR_PRODUCTS,
};

pub const CONFIG_PATH_VAR: &str = "WISHREC_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "wishrec.conf";

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_DATA_DIRECTORY: &str = "data";
const DEFAULT_SNAPSHOT_PATH: &str = "model.bin";
const DEFAULT_NUM_ITEMS_TO_RECOMMEND: usize = 20;

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub log: LogConfig,
    pub data: DataConfig,
    pub model: ModelConfig,
    pub blend: BlendConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LogConfig {
    pub level: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DataConfig {
    pub directory: PathBuf,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ModelConfig {
    pub snapshot_path: PathBuf,
    pub num_neighbors: usize,
    pub num_similar_products: usize,
    pub num_items_to_recommend: usize,
    pub num_threads: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BlendConfig {
    pub weight_collaborative: f64,
    pub weight_content: f64,
    pub candidate_multiplier: usize,
}

impl AppConfig {
    /// Reads the file named by `WISHREC_CONFIG` (or `wishrec.conf`), if present.
    pub fn from_env() -> Result<AppConfig, ConfigError> {
        let config_path = env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        AppConfig::new(&config_path)
    }

    pub fn new(config_path: &str) -> Result<AppConfig, ConfigError> {
        let mut conf = Config::default();

        // A missing file leaves defaults and environment
        if let Ok(config_file) = File::open(config_path) {
            let config_text = ConfigText::new(config_file, config_path)?;
            conf.add_source(config_text);
        }

        let config_env = Env::new(&[
            (
                ConfPath::from(&["data", "directory"]),
                OsStr::new("WISHREC_DATA_DIR"),
            ),
            (
                ConfPath::from(&["model", "snapshot_path"]),
                OsStr::new("WISHREC_SNAPSHOT"),
            ),
        ]);
        conf.add_source(config_env);

        AppConfig::parse(&conf)
    }

    fn parse(conf: &Config) -> Result<AppConfig, ConfigError> {
        let config = AppConfig {
            log: LogConfig::parse(conf, ConfPath::from(&["log"]))?,
            data: DataConfig::parse(conf, ConfPath::from(&["data"]))?,
            model: ModelConfig::parse(conf, ConfPath::from(&["model"]))?,
            blend: BlendConfig::parse(conf, ConfPath::from(&["blend"]))?,
        };
        config.recommender_settings()?;
        Ok(config)
    }

    pub fn recommender_settings(&self) -> Result<RecommenderSettings, ConfigError> {
        if self.blend.candidate_multiplier == 0 {
            return Err(ConfigError::Invalid {
                key: "blend.candidate_multiplier",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(RecommenderSettings {
            num_neighbors: self.model.num_neighbors,
            num_similar_products: self.model.num_similar_products,
            candidate_multiplier: self.blend.candidate_multiplier,
            weights: BlendWeights::new(self.blend.weight_collaborative, self.blend.weight_content)?,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        let weights = BlendWeights::default();
        AppConfig {
            log: LogConfig {
                level: DEFAULT_LOG_LEVEL.to_string(),
            },
            data: DataConfig {
                directory: PathBuf::from(DEFAULT_DATA_DIRECTORY),
            },
            model: ModelConfig {
                snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
                num_neighbors: DEFAULT_NUM_NEIGHBORS,
                num_similar_products: DEFAULT_NUM_SIMILAR_PRODUCTS,
                num_items_to_recommend: DEFAULT_NUM_ITEMS_TO_RECOMMEND,
                num_threads: default_num_threads(),
            },
            blend: BlendConfig {
                weight_collaborative: weights.collaborative,
                weight_content: weights.content,
                candidate_multiplier: DEFAULT_CANDIDATE_MULTIPLIER,
            },
        }
    }
}

// Detect number of CPUs
fn default_num_threads() -> usize {
    sys_info::cpu_num()
        .map(|cpus| cpus as usize)
        .unwrap_or(1)
        .max(1)
}

impl LogConfig {
    fn parse(conf: &Config, path: ConfPath) -> Result<LogConfig, ConfigError> {
        Ok(LogConfig {
            level: conf
                .get(path.push("level"))
                .unquoted()
                .try_value()?
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }
}

impl DataConfig {
    fn parse(conf: &Config, path: ConfPath) -> Result<DataConfig, ConfigError> {
        let directory: String = conf
            .get(path.push("directory"))
            .unquoted()
            .try_value()?
            .unwrap_or_else(|| DEFAULT_DATA_DIRECTORY.to_string());
        Ok(DataConfig {
            directory: PathBuf::from(directory),
        })
    }
}

impl ModelConfig {
    fn parse(conf: &Config, path: ConfPath) -> Result<ModelConfig, ConfigError> {
        let snapshot_path: String = conf
            .get(path.push("snapshot_path"))
            .unquoted()
            .try_value()?
            .unwrap_or_else(|| DEFAULT_SNAPSHOT_PATH.to_string());
        let num_threads: usize = conf
            .get(path.push("num_threads"))
            .trim()
            .try_value()?
            .unwrap_or_else(default_num_threads);
        if num_threads == 0 {
            return Err(ConfigError::Invalid {
                key: "model.num_threads",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(ModelConfig {
            snapshot_path: PathBuf::from(snapshot_path),
            num_neighbors: conf
                .get(path.push("num_neighbors"))
                .trim()
                .try_value()?
                .unwrap_or(DEFAULT_NUM_NEIGHBORS),
            num_similar_products: conf
                .get(path.push("num_similar_products"))
                .trim()
                .try_value()?
                .unwrap_or(DEFAULT_NUM_SIMILAR_PRODUCTS),
            num_items_to_recommend: conf
                .get(path.push("num_items_to_recommend"))
                .trim()
                .try_value()?
                .unwrap_or(DEFAULT_NUM_ITEMS_TO_RECOMMEND),
            num_threads,
        })
    }
}

impl BlendConfig {
    fn parse(conf: &Config, path: ConfPath) -> Result<BlendConfig, ConfigError> {
        let defaults = BlendWeights::default();
        Ok(BlendConfig {
            weight_collaborative: conf
                .get(path.push("weight_collaborative"))
                .trim()
                .try_value()?
                .unwrap_or(defaults.collaborative),
            weight_content: conf
                .get(path.push("weight_content"))
                .trim()
                .try_value()?
                .unwrap_or(defaults.content),
            candidate_multiplier: conf
                .get(path.push("candidate_multiplier"))
                .trim()
                .try_value()?
                .unwrap_or(DEFAULT_CANDIDATE_MULTIPLIER),
        })
    }
}
