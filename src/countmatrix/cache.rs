use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crc::{CRC_64_ECMA_182, Crc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::countmatrix::binner;
use crate::dataset::{DatasetId, FeatureList, GenomicDataset, SignalSource};
use crate::error::Result;
use crate::geometry::BinGeometry;
use crate::io::matrix;

const DIGEST: Crc<u64> = Crc::<u64>::new(&CRC_64_ECMA_182);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub feature_list_id: u64,
    pub dataset_id: DatasetId,
    pub geometry: BinGeometry,
}

impl CacheKey {
    pub fn new(feature_list: &FeatureList, dataset_id: DatasetId, geometry: BinGeometry) -> Self {
        Self {
            feature_list_id: feature_list.id,
            dataset_id,
            geometry,
        }
    }

    pub fn digest(&self) -> String {
        let canonical = format!(
            "fl={}|ds={}|{}",
            self.feature_list_id,
            self.dataset_id,
            self.geometry.canonical()
        );
        format!("{:016x}", DIGEST.checksum(canonical.as_bytes()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountMatrix {
    pub id: u64,
    pub key: CacheKey,
    pub path: PathBuf,
}

impl CountMatrix {
    pub fn read_text(&self) -> Result<String> {
        Ok(fs::read_to_string(&self.path)?)
    }
}

// Deduplicating store of binned count matrices. At most one build runs per
// key; concurrent callers for the same key wait for it and receive the same
// `CountMatrix`.
#[derive(Debug)]
pub struct CountMatrixCache {
    root: PathBuf,
    entries: Mutex<HashMap<CacheKey, CountMatrix>>,
    inflight: Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>,
    next_id: AtomicU64,
    builds: AtomicU64,
}

impl CountMatrixCache {
    pub fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
            entries: Mutex::new(HashMap::new()),
            inflight: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            builds: AtomicU64::new(0),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn get(&self, key: &CacheKey) -> Option<CountMatrix> {
        lock(&self.entries).get(key).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn build_count(&self) -> u64 {
        self.builds.load(Ordering::SeqCst)
    }

    pub fn get_or_build(
        &self,
        feature_list: &FeatureList,
        dataset: &GenomicDataset,
        geometry: &BinGeometry,
    ) -> Result<CountMatrix> {
        geometry.validate()?;
        let key = CacheKey::new(feature_list, dataset.dataset_id(), *geometry);
        if let Some(hit) = self.get(&key) {
            info!(id = hit.id, dataset = %key.dataset_id, "count_matrix_cache_hit");
            return Ok(hit);
        }

        let key_lock = {
            let mut map = lock(&self.inflight);
            Arc::clone(
                map.entry(key.clone())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        let _guard = lock(key_lock.as_ref());

        if let Some(hit) = self.get(&key) {
            info!(id = hit.id, dataset = %key.dataset_id, "count_matrix_cache_hit");
            return Ok(hit);
        }

        let built = self.materialize(feature_list, dataset, geometry, &key);
        lock(&self.inflight).remove(&key);
        built
    }

    fn materialize(
        &self,
        feature_list: &FeatureList,
        dataset: &GenomicDataset,
        geometry: &BinGeometry,
        key: &CacheKey,
    ) -> Result<CountMatrix> {
        let path = self.root.join(format!("{}.matrix", key.digest()));
        if !self.reusable(&path, geometry) {
            info!(dataset = %key.dataset_id, path = %path.display(), "count_matrix_build");
            binner::build_matrix_file(feature_list, dataset, geometry, &path)?;
            self.builds.fetch_add(1, Ordering::SeqCst);
        } else {
            info!(path = %path.display(), "count_matrix_reuse");
        }

        let entry = CountMatrix {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            key: key.clone(),
            path,
        };
        lock(&self.entries).insert(key.clone(), entry.clone());
        Ok(entry)
    }

    pub fn inflight_len(&self) -> usize {
        lock(&self.inflight).len()
    }

    // A matrix persisted by an earlier process is adopted when its header
    // matches the requested geometry.
    fn reusable(&self, path: &Path, geometry: &BinGeometry) -> bool {
        if !path.exists() {
            return false;
        }
        match matrix::read_header(path) {
            Ok(bins) => bins == geometry.labels(),
            Err(_) => false,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
