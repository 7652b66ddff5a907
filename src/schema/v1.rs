use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geometry::BinGeometry;
use crate::math::cluster;

pub const SCHEMA_VERSION: &str = "v1";

// Key under `sort_orders` for the analysis's own sort vector. Matrix ids
// are never 0, so the slot cannot collide with a matrix.
pub const USER_SORT_VECTOR_ID: u64 = 0;

// `(left, right, distance, size)`; leaves are `0..n`, merge `i` creates
// cluster `n + i`.
pub type DendrogramMerge = (usize, usize, f64, usize);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dendrogram {
    pub merges: Vec<DendrogramMerge>,
    pub leaves: Vec<usize>,
}

impl From<&cluster::Dendrogram> for Dendrogram {
    fn from(tree: &cluster::Dendrogram) -> Self {
        Self {
            merges: tree
                .merges
                .iter()
                .map(|m| (m.left, m.right, m.distance, m.size))
                .collect(),
            leaves: tree.leaves.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisArtifact {
    pub tool: String,
    pub version: String,
    pub schema_version: String,
    pub geometry: Option<BinGeometry>,
    pub dendrogram: Dendrogram,
    pub correlation_matrix: Vec<Vec<f64>>,
    pub max_abs_correlation_values: Vec<f64>,
    pub matrix_ids: Vec<u64>,
    pub matrix_names: Vec<String>,
    pub cluster_members: BTreeMap<usize, Vec<Vec<u64>>>,
    pub cluster_medoids: BTreeMap<usize, Vec<u64>>,
    // Sort-vector id -> row permutation. JSON keys are stringified ids.
    pub sort_orders: BTreeMap<u64, Vec<usize>>,
    pub bins: Vec<String>,
    pub row_names: Vec<String>,
    pub vectors: BTreeMap<u64, Vec<f64>>,
    #[serde(default)]
    pub sort_vector: Option<Vec<f64>>,
}

impl AnalysisArtifact {
    pub fn matrix_index(&self, id: u64) -> Option<usize> {
        self.matrix_ids.iter().position(|&m| m == id)
    }

    pub fn matrix_index_by_name(&self, name: &str) -> Option<usize> {
        self.matrix_names.iter().position(|m| m == name)
    }

    pub fn available_k(&self) -> Vec<usize> {
        self.cluster_members.keys().copied().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KMeansEntry {
    pub centroids: Vec<Vec<f64>>,
    pub labels: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVectorBundle {
    pub kmeans_results: BTreeMap<usize, KMeansEntry>,
    pub vector_matrix: Vec<Vec<f64>>,
    pub bins: Vec<String>,
    pub row_names: Vec<String>,
}
