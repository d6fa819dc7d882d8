//! Hybrid product recommendations from wishlist adds and declared category
//! interests, blended with category/brand similarity between products.

pub mod cli;
pub mod config;
pub mod config_processors;
pub mod error;
pub mod handle;
pub mod interactions;
pub mod io;
pub mod knn;
pub mod logging;
pub mod model;
pub mod recommenders;
pub mod snapshot;
pub mod stats;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use crate::handle::{load_or_train, ModelHandle};
pub use crate::model::{train, train_from, TrainedState};
pub use crate::recommenders::{BlendWeights, Recommender, RecommenderSettings};

/// Sizes the global rayon pool used by the similarity builds. Only the first call has effect.
pub fn init_thread_pool(num_threads: usize) {
    if let Err(error) = rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
    {
        tracing::debug!(%error, "global thread pool already initialised");
    }
}
