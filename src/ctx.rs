use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::geometry::BinGeometry;
use crate::io::matrix::BinnedMatrix;
use crate::io::matrix_list::MatrixInput;
use crate::math::cluster::{DEFAULT_SEED, Dendrogram};
use crate::schema::v1::AnalysisArtifact;

#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub out_dir: PathBuf,
    pub artifact_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSet {
    pub members: Vec<Vec<usize>>,
    pub medoids: Vec<usize>,
}

#[derive(Debug)]
pub struct Ctx {
    pub inputs: Vec<MatrixInput>,
    pub geometry: Option<BinGeometry>,
    pub sort_vector_text: Option<String>,
    pub threads: usize,
    pub seed: u64,
    pub warnings: Vec<String>,
    pub bins: Vec<String>,
    pub row_names: Vec<String>,
    pub matrices: Vec<BinnedMatrix>,
    pub vectors: Vec<Vec<f64>>,
    pub correlation: Vec<Vec<f64>>,
    pub max_abs_correlation: Vec<f64>,
    pub dendrogram: Option<Dendrogram>,
    pub clusters: BTreeMap<usize, ClusterSet>,
    pub user_vector: Option<Vec<f64>>,
    pub sort_orders: BTreeMap<u64, Vec<usize>>,
    pub output: OutputPaths,
    pub artifact: Option<AnalysisArtifact>,
}

impl Ctx {
    pub fn new(inputs: Vec<MatrixInput>, artifact_path: PathBuf) -> Self {
        let out_dir = artifact_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_default();
        Self {
            inputs,
            geometry: None,
            sort_vector_text: None,
            threads: 0,
            seed: DEFAULT_SEED,
            warnings: Vec::new(),
            bins: Vec::new(),
            row_names: Vec::new(),
            matrices: Vec::new(),
            vectors: Vec::new(),
            correlation: Vec::new(),
            max_abs_correlation: Vec::new(),
            dendrogram: None,
            clusters: BTreeMap::new(),
            user_vector: None,
            sort_orders: BTreeMap::new(),
            output: OutputPaths {
                out_dir,
                artifact_path,
            },
            artifact: None,
        }
    }

    pub fn matrix_ids(&self) -> Vec<u64> {
        self.inputs.iter().map(|m| m.id).collect()
    }
}
