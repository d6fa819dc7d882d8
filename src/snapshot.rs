use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

use serde_derive::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::SnapshotError;
use crate::interactions::InteractionMatrix;
use crate::io::SourceTables;
use crate::knn::index_map::IdIndex;
use crate::knn::product_index::ProductFeatureIndex;
use crate::knn::user_index::UserSimilarityIndex;
use crate::model::TrainedState;
use crate::stats::TrainingDataStats;

pub const MAGIC: &[u8; 8] = b"WISHREC\0";
pub const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = MAGIC.len() + 4;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    tables: &'a SourceTables,
    interactions: &'a InteractionMatrix,
    user_similarity: &'a UserSimilarityIndex,
    product_similarity: &'a ProductFeatureIndex,
    stats: &'a TrainingDataStats,
}

#[derive(Deserialize)]
struct Snapshot {
    tables: SourceTables,
    interactions: InteractionMatrix,
    user_similarity: UserSimilarityIndex,
    product_similarity: ProductFeatureIndex,
    stats: TrainingDataStats,
}

impl Snapshot {
    fn validate(&self) -> Result<(), SnapshotError> {
        if !self.interactions.is_consistent() {
            return Err(SnapshotError::Incomplete(
                "interaction matrix does not match its index maps".to_string(),
            ));
        }
        let users = IdIndex::from_ids(self.tables.users.iter().map(|user| user.id));
        if &users != self.interactions.users() {
            return Err(SnapshotError::Incomplete(
                "user index does not match the users table".to_string(),
            ));
        }
        let products = IdIndex::from_ids(self.tables.products.iter().map(|product| product.id));
        if &products != self.interactions.products() {
            return Err(SnapshotError::Incomplete(
                "product index does not match the products table".to_string(),
            ));
        }
        if !self.user_similarity.is_square_of(users.len()) {
            return Err(SnapshotError::Incomplete(format!(
                "user similarity matrix is not {0}x{0}",
                users.len()
            )));
        }
        if !self.product_similarity.is_square_of(products.len()) {
            return Err(SnapshotError::Incomplete(format!(
                "product similarity matrix is not {0}x{0}",
                products.len()
            )));
        }
        Ok(())
    }
}

/// Encodes the full trained state behind a magic marker and format version.
pub fn save(state: &TrainedState) -> Result<Vec<u8>, SnapshotError> {
    let snapshot = SnapshotRef {
        tables: state.tables(),
        interactions: state.interactions(),
        user_similarity: state.user_similarity(),
        product_similarity: state.product_similarity(),
        stats: state.stats(),
    };
    let mut blob = Vec::with_capacity(HEADER_LEN + 1024);
    blob.extend_from_slice(MAGIC);
    blob.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bincode::serialize_into(&mut blob, &snapshot)?;
    Ok(blob)
}

/// Decodes and validates a snapshot. Any problem is reported as a
/// `SnapshotError` so the caller can retrain instead.
pub fn load(blob: &[u8]) -> Result<TrainedState, SnapshotError> {
    if blob.len() < HEADER_LEN || &blob[..MAGIC.len()] != MAGIC {
        return Err(SnapshotError::BadMagic);
    }
    let mut version = [0_u8; 4];
    version.copy_from_slice(&blob[MAGIC.len()..HEADER_LEN]);
    let found = u32::from_le_bytes(version);
    if found != FORMAT_VERSION {
        return Err(SnapshotError::UnsupportedVersion {
            found,
            expected: FORMAT_VERSION,
        });
    }

    let snapshot: Snapshot = bincode::deserialize(&blob[HEADER_LEN..])?;
    snapshot.validate()?;

    Ok(TrainedState::assemble(
        snapshot.tables,
        snapshot.interactions,
        snapshot.user_similarity,
        snapshot.product_similarity,
        snapshot.stats,
    ))
}

/// Writes next to `path` first and renames, so readers never see a half written file.
pub fn save_to_path(state: &TrainedState, path: &Path) -> Result<(), SnapshotError> {
    let start_time = Instant::now();
    let blob = save(state)?;
    let staging = path.with_extension("partial");
    if let Err(error) = write_then_rename(&blob, &staging, path) {
        // the target is untouched, only the staging file may be left over
        if let Err(cleanup) = fs::remove_file(&staging) {
            debug!(path = %staging.display(), %cleanup, "no staging file to remove");
        }
        return Err(error.into());
    }
    info!(
        path = %path.display(),
        bytes = blob.len(),
        micros = start_time.elapsed().as_micros() as u64,
        "saved model snapshot"
    );
    Ok(())
}

fn write_then_rename(blob: &[u8], staging: &Path, path: &Path) -> std::io::Result<()> {
    let mut file = fs::File::create(staging)?;
    file.write_all(blob)?;
    file.sync_all()?;
    drop(file);
    fs::rename(staging, path)
}

pub fn load_from_path(path: &Path) -> Result<TrainedState, SnapshotError> {
    let start_time = Instant::now();
    let blob = fs::read(path)?;
    let state = load(&blob)?;
    info!(
        path = %path.display(),
        bytes = blob.len(),
        micros = start_time.elapsed().as_micros() as u64,
        "loaded model snapshot"
    );
    Ok(state)
}

#[cfg(test)]
mod snapshot_test {
    use super::*;
    use crate::model::train;
    use crate::test_fixtures::scenario_tables;

    #[test]
    fn should_restore_an_equal_state() {
        let state = train(scenario_tables());
        let restored = load(&save(&state).unwrap()).unwrap();

        assert_eq!(state.tables(), restored.tables());
        assert_eq!(state.interactions(), restored.interactions());
        assert_eq!(state.user_similarity(), restored.user_similarity());
        assert_eq!(state.product_similarity(), restored.product_similarity());
        assert_eq!(state.stats(), restored.stats());
        assert_eq!(state.wishlist(2), restored.wishlist(2));
    }

    #[test]
    fn should_reject_foreign_and_truncated_blobs() {
        assert!(matches!(load(b"garbage"), Err(SnapshotError::BadMagic)));
        assert!(matches!(load(b"NOTWISH\0\x01\0\0\0"), Err(SnapshotError::BadMagic)));

        let blob = save(&train(scenario_tables())).unwrap();
        let truncated = &blob[..blob.len() / 2];
        assert!(matches!(load(truncated), Err(SnapshotError::Codec(_))));
    }

    #[test]
    fn should_reject_other_format_versions() {
        let mut blob = save(&train(scenario_tables())).unwrap();
        blob[MAGIC.len()..HEADER_LEN].copy_from_slice(&2_u32.to_le_bytes());
        match load(&blob) {
            Err(SnapshotError::UnsupportedVersion { found, expected }) => {
                assert_eq!(2, found);
                assert_eq!(FORMAT_VERSION, expected);
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    fn encode(snapshot: &SnapshotRef) -> Vec<u8> {
        let mut blob = Vec::new();
        blob.extend_from_slice(MAGIC);
        blob.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bincode::serialize_into(&mut blob, snapshot).unwrap();
        blob
    }

    #[test]
    fn should_reject_structurally_inconsistent_snapshots() {
        let state = train(scenario_tables());
        let mut tables = state.tables().clone();
        tables.users.pop();
        let blob = encode(&SnapshotRef {
            tables: &tables,
            interactions: state.interactions(),
            user_similarity: state.user_similarity(),
            product_similarity: state.product_similarity(),
            stats: state.stats(),
        });

        assert!(matches!(load(&blob), Err(SnapshotError::Incomplete(_))));
    }

    #[test]
    fn should_reject_similarity_matrices_of_another_size() {
        let state = train(scenario_tables());
        let mut smaller_tables = scenario_tables();
        smaller_tables.users.pop();
        smaller_tables.products.pop();
        let smaller = train(smaller_tables);
        assert_eq!(2, smaller.user_similarity().len());
        assert_eq!(2, smaller.product_similarity().len());

        let wrong_users = encode(&SnapshotRef {
            tables: state.tables(),
            interactions: state.interactions(),
            user_similarity: smaller.user_similarity(),
            product_similarity: state.product_similarity(),
            stats: state.stats(),
        });
        match load(&wrong_users) {
            Err(SnapshotError::Incomplete(reason)) => assert!(reason.contains("user similarity")),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }

        let wrong_products = encode(&SnapshotRef {
            tables: state.tables(),
            interactions: state.interactions(),
            user_similarity: state.user_similarity(),
            product_similarity: smaller.product_similarity(),
            stats: state.stats(),
        });
        match load(&wrong_products) {
            Err(SnapshotError::Incomplete(reason)) => assert!(reason.contains("product similarity")),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn should_write_atomically_and_leave_no_staging_file_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let state = train(scenario_tables());

        let path = dir.path().join("model.bin");
        save_to_path(&state, &path).unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("partial").exists());
        assert_eq!(state.tables(), load_from_path(&path).unwrap().tables());

        // a directory in the way makes the final rename fail
        let blocked = dir.path().join("blocked.bin");
        fs::create_dir_all(blocked.join("occupied")).unwrap();
        assert!(matches!(save_to_path(&state, &blocked), Err(SnapshotError::Io(_))));
        assert!(!blocked.with_extension("partial").exists());
        assert!(blocked.is_dir());
    }
}
