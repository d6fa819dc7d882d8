use std::path::Path;
use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use crate::error::{SnapshotError, TrainingError};
use crate::io::Repository;
use crate::model::{train_from, TrainedState};
use crate::snapshot;

/// Shared access to the trained state currently in use.
///
/// The lock only guards the pointer. Queries run against the `Arc` they were
/// handed, so a replacement never disturbs a reader that is already running.
pub struct ModelHandle {
    current: RwLock<Arc<TrainedState>>,
}

impl ModelHandle {
    pub fn new(state: TrainedState) -> Self {
        ModelHandle {
            current: RwLock::new(Arc::new(state)),
        }
    }

    pub fn current(&self) -> Arc<TrainedState> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Swaps in `state` and returns the one it replaced.
    pub fn replace(&self, state: TrainedState) -> Arc<TrainedState> {
        let fresh = Arc::new(state);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::replace(&mut *guard, fresh)
    }

    /// Trains a fresh state from `repository` and swaps it in.
    pub fn retrain<R: Repository + ?Sized>(&self, repository: &R) -> Result<(), TrainingError> {
        let state = train_from(repository)?;
        self.replace(state);
        Ok(())
    }

    /// Loads the snapshot at `path` and swaps it in. The current state is kept on failure.
    pub fn reload(&self, path: &Path) -> Result<(), SnapshotError> {
        let state = snapshot::load_from_path(path)?;
        self.replace(state);
        Ok(())
    }
}

/// Uses the snapshot at `snapshot_path` when it loads cleanly. Otherwise
/// trains from `repository` and writes a fresh snapshot.
pub fn load_or_train<R: Repository + ?Sized>(
    repository: &R,
    snapshot_path: &Path,
) -> Result<TrainedState, TrainingError> {
    match snapshot::load_from_path(snapshot_path) {
        Ok(state) => Ok(state),
        Err(error) => {
            warn!(
                path = %snapshot_path.display(),
                %error,
                "model snapshot unusable, retraining"
            );
            let state = train_from(repository)?;
            snapshot::save_to_path(&state, snapshot_path)?;
            info!(path = %snapshot_path.display(), "retrained model");
            Ok(state)
        }
    }
}
