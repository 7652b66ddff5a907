// Lazily loaded analysis artifact plus the views derived from it.
// The artifact is parsed at most once per `OutputStore`. Replacing the file
// on disk is detected by `is_stale`, but the store only reloads after an
// explicit `invalidate`.

pub mod views;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AnalysisError, Result};
use crate::schema::v1::AnalysisArtifact;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    len: u64,
    modified: Option<SystemTime>,
}

impl Fingerprint {
    fn of(path: &Path) -> Option<Self> {
        let meta = fs::metadata(path).ok()?;
        Some(Self {
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

#[derive(Debug)]
struct Loaded {
    artifact: AnalysisArtifact,
    fingerprint: Option<Fingerprint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ViewRequest {
    Summary,
    SortVector { id: u64 },
    Ks { matrix_id: u64, vector_id: u64, quantiles: usize },
    KsBetween { a: u64, b: u64 },
    Cluster { k: usize, cluster_id: usize },
    Heatmap { k: usize, cluster_id: usize },
    Scatterplot { x_index: usize, y_index: usize },
    Boxplot { matrix_name: String, quantiles: usize },
    FeatureValues { row_name: String },
}

#[derive(Debug)]
pub struct OutputStore {
    path: PathBuf,
    loaded: OnceLock<Loaded>,
    init: Mutex<()>,
}

impl OutputStore {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(AnalysisError::AnalysisNotReady(format!(
                "no artifact at {}",
                path.display()
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
            loaded: OnceLock::new(),
            init: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }

    pub fn artifact(&self) -> Result<&AnalysisArtifact> {
        if let Some(loaded) = self.loaded.get() {
            return Ok(&loaded.artifact);
        }
        {
            let _guard = self.init.lock().unwrap_or_else(|p| p.into_inner());
            if self.loaded.get().is_none() {
                let loaded = load(&self.path)?;
                let _ = self.loaded.set(loaded);
            }
        }
        self.loaded
            .get()
            .map(|l| &l.artifact)
            .ok_or_else(|| AnalysisError::AnalysisNotReady(self.path.display().to_string()))
    }

    /// True once the file on disk differs from the one that was loaded.
    /// Always false before the first load.
    pub fn is_stale(&self) -> bool {
        match self.loaded.get() {
            Some(loaded) => Fingerprint::of(&self.path) != loaded.fingerprint,
            None => false,
        }
    }

    pub fn invalidate(&mut self) {
        if self.loaded.take().is_some() {
            info!(path = %self.path.display(), "artifact_invalidated");
        }
    }

    pub fn render(&self, request: &ViewRequest) -> Result<serde_json::Value> {
        let a = self.artifact()?;
        let value = match request {
            ViewRequest::Summary => serde_json::to_value(views::summary(a))?,
            ViewRequest::SortVector { id } => serde_json::to_value(views::sort_vector(a, *id)?)?,
            ViewRequest::Ks {
                matrix_id,
                vector_id,
                quantiles,
            } => serde_json::to_value(views::ks(a, *matrix_id, *vector_id, *quantiles)?)?,
            ViewRequest::KsBetween { a: x, b: y } => {
                serde_json::to_value(views::ks_between(a, *x, *y)?)?
            }
            ViewRequest::Cluster { k, cluster_id } => {
                serde_json::to_value(views::cluster(a, *k, *cluster_id)?)?
            }
            ViewRequest::Heatmap { k, cluster_id } => {
                serde_json::to_value(views::heatmap(a, *k, *cluster_id)?)?
            }
            ViewRequest::Scatterplot { x_index, y_index } => {
                serde_json::to_value(views::scatterplot(a, *x_index, *y_index)?)?
            }
            ViewRequest::Boxplot {
                matrix_name,
                quantiles,
            } => serde_json::to_value(views::boxplot(a, matrix_name, *quantiles)?)?,
            ViewRequest::FeatureValues { row_name } => {
                serde_json::to_value(views::feature_values(a, row_name)?)?
            }
        };
        Ok(value)
    }
}

fn load(path: &Path) -> Result<Loaded> {
    // Fingerprint first, so a replacement racing the read shows up as stale.
    let fingerprint = Fingerprint::of(path);
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(AnalysisError::AnalysisNotReady(format!(
                "no artifact at {}",
                path.display()
            )));
        }
        Err(err) => return Err(err.into()),
    };
    let artifact: AnalysisArtifact = serde_json::from_str(&text)?;
    check_shape(&artifact, path)?;
    info!(
        path = %path.display(),
        matrices = artifact.matrix_ids.len(),
        rows = artifact.row_names.len(),
        "artifact_loaded"
    );
    Ok(Loaded {
        artifact,
        fingerprint,
    })
}

fn check_shape(artifact: &AnalysisArtifact, path: &Path) -> Result<()> {
    let rows = artifact.row_names.len();
    let n = artifact.matrix_ids.len();
    let bad = |what: String| -> Result<()> {
        Err(AnalysisError::InputFormat(format!(
            "{}: {}",
            path.display(),
            what
        )))
    };
    if artifact.matrix_names.len() != n || artifact.correlation_matrix.len() != n {
        return bad("matrix id, name and correlation lists differ in length".to_string());
    }
    if artifact.correlation_matrix.iter().any(|row| row.len() != n) {
        return bad("correlation matrix is not square".to_string());
    }
    for (id, vector) in &artifact.vectors {
        if vector.len() != rows {
            return bad(format!("vector {} has {} values for {} rows", id, vector.len(), rows));
        }
    }
    for (id, order) in &artifact.sort_orders {
        if order.len() != rows || order.iter().any(|&i| i >= rows) {
            return bad(format!("sort order {} is not a permutation of {} rows", id, rows));
        }
    }
    Ok(())
}
