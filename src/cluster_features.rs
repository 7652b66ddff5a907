use std::collections::BTreeMap;
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::io::matrix::read_consistent;
use crate::io::matrix_list::{MatrixInput, read_matrix_list};
use crate::io::write_json_atomic;
use crate::math::cluster::{self, DEFAULT_SEED};
use crate::math::stats;
use crate::schema::v1::{FeatureVectorBundle, KMeansEntry};

pub const MIN_K: usize = 2;
pub const MAX_K: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct VectorMatrix {
    pub bins: Vec<String>,
    pub row_names: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

// Reads the matrices in list order. A header or row-name disagreement with
// the first matrix aborts before any later file is opened.
pub fn build_vector_matrix(inputs: &[MatrixInput]) -> Result<VectorMatrix> {
    let matrices = read_consistent(inputs, None)?;
    let first = &matrices[0];
    let mut values = vec![Vec::with_capacity(matrices.len()); first.n_rows()];
    for matrix in &matrices {
        for (row, sum) in values.iter_mut().zip(matrix.row_sums()) {
            row.push(sum);
        }
    }
    Ok(VectorMatrix {
        bins: first.bins.clone(),
        row_names: first.row_names.clone(),
        values,
    })
}

pub fn cluster_features(inputs: &[MatrixInput]) -> Result<FeatureVectorBundle> {
    cluster_features_seeded(inputs, DEFAULT_SEED)
}

pub fn cluster_features_seeded(inputs: &[MatrixInput], seed: u64) -> Result<FeatureVectorBundle> {
    let vm = build_vector_matrix(inputs)?;
    let whitened = stats::whiten_columns(&vm.values);

    let mut kmeans_results = BTreeMap::new();
    for k in MIN_K..=MAX_K.min(whitened.len()) {
        let km = cluster::kmeans(&whitened, k, seed)?;
        info!(k, iterations = km.n_iter, inertia = km.inertia, "feature_kmeans_ready");
        kmeans_results.insert(
            k,
            KMeansEntry {
                centroids: km.centroids,
                labels: km.labels,
            },
        );
    }

    info!(
        features = vm.row_names.len(),
        matrices = inputs.len(),
        runs = kmeans_results.len(),
        "feature_clustering_done"
    );
    Ok(FeatureVectorBundle {
        kmeans_results,
        vector_matrix: vm.values,
        bins: vm.bins,
        row_names: vm.row_names,
    })
}

pub fn cluster_features_from_list(list_path: &Path) -> Result<FeatureVectorBundle> {
    let inputs = read_matrix_list(list_path)?;
    cluster_features(&inputs)
}

pub fn write_bundle(path: &Path, bundle: &FeatureVectorBundle) -> Result<()> {
    write_json_atomic(path, bundle)
}
