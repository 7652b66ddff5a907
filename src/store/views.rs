use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{AnalysisError, Result};
use crate::math::stats::{self, FiveNumber, KsResult};
use crate::schema::v1::{AnalysisArtifact, Dendrogram, USER_SORT_VECTOR_ID};

#[derive(Debug, Clone, Serialize)]
pub struct SummaryView<'a> {
    pub dendrogram: &'a Dendrogram,
    pub max_abs_correlation_values: &'a [f64],
    pub cluster_members: &'a BTreeMap<usize, Vec<Vec<u64>>>,
    pub correlation_matrix: &'a [Vec<f64>],
    pub matrix_ids: &'a [u64],
    pub matrix_names: &'a [String],
    pub cluster_medoids: &'a BTreeMap<usize, Vec<u64>>,
}

pub fn summary(artifact: &AnalysisArtifact) -> SummaryView<'_> {
    SummaryView {
        dendrogram: &artifact.dendrogram,
        max_abs_correlation_values: &artifact.max_abs_correlation_values,
        cluster_members: &artifact.cluster_members,
        correlation_matrix: &artifact.correlation_matrix,
        matrix_ids: &artifact.matrix_ids,
        matrix_names: &artifact.matrix_names,
        cluster_medoids: &artifact.cluster_medoids,
    }
}

pub fn sort_vector(artifact: &AnalysisArtifact, id: u64) -> Result<&[usize]> {
    artifact
        .sort_orders
        .get(&id)
        .map(Vec::as_slice)
        .ok_or_else(|| AnalysisError::NotFound(format!("sort vector {}", id)))
}

fn matrix_vector(artifact: &AnalysisArtifact, matrix_id: u64) -> Result<&[f64]> {
    artifact
        .vectors
        .get(&matrix_id)
        .map(Vec::as_slice)
        .ok_or_else(|| AnalysisError::NotFound(format!("matrix {}", matrix_id)))
}

// Splits `order` into `quantiles` contiguous groups whose sizes differ by at
// most one.
fn quantile_groups(order: &[usize], quantiles: usize) -> Result<Vec<&[usize]>> {
    if quantiles == 0 || quantiles > order.len() {
        return Err(AnalysisError::InvalidParameter(format!(
            "quantiles must be in [1, {}], got {}",
            order.len(),
            quantiles
        )));
    }
    let n = order.len();
    Ok((0..quantiles)
        .map(|q| &order[q * n / quantiles..(q + 1) * n / quantiles])
        .collect())
}

#[derive(Debug, Clone, Serialize)]
pub struct KsView {
    pub matrix_id: u64,
    pub vector_id: u64,
    pub quantiles: Vec<KsResult>,
}

pub fn ks(
    artifact: &AnalysisArtifact,
    matrix_id: u64,
    vector_id: u64,
    quantiles: usize,
) -> Result<KsView> {
    let values = matrix_vector(artifact, matrix_id)?;
    let order = sort_vector(artifact, vector_id)?;
    let groups = quantile_groups(order, quantiles)?;
    let results = groups
        .into_iter()
        .map(|group| {
            let sample: Vec<f64> = group.iter().map(|&i| values[i]).collect();
            stats::ks_2samp(&sample, values)
        })
        .collect();
    Ok(KsView {
        matrix_id,
        vector_id,
        quantiles: results,
    })
}

pub fn ks_between(artifact: &AnalysisArtifact, a: u64, b: u64) -> Result<KsResult> {
    let va = matrix_vector(artifact, a)?;
    let vb = matrix_vector(artifact, b)?;
    Ok(stats::ks_2samp(va, vb))
}

#[derive(Debug, Clone, Serialize)]
pub struct ClusterView {
    pub k: usize,
    pub cluster_id: usize,
    pub members: Vec<u64>,
    pub member_names: Vec<String>,
    pub medoid: u64,
}

fn cluster_members(artifact: &AnalysisArtifact, k: usize, cluster_id: usize) -> Result<(&[u64], u64)> {
    let Some(clusters) = artifact.cluster_members.get(&k) else {
        return Err(AnalysisError::InvalidParameter(format!(
            "k={} not available, have {:?}",
            k,
            artifact.available_k()
        )));
    };
    let members = clusters
        .get(cluster_id)
        .ok_or_else(|| AnalysisError::NotFound(format!("cluster {} at k={}", cluster_id, k)))?;
    let medoid = artifact
        .cluster_medoids
        .get(&k)
        .and_then(|m| m.get(cluster_id))
        .copied()
        .ok_or_else(|| AnalysisError::NotFound(format!("medoid of cluster {} at k={}", cluster_id, k)))?;
    Ok((members, medoid))
}

fn names_of(artifact: &AnalysisArtifact, ids: &[u64]) -> Vec<String> {
    ids.iter()
        .filter_map(|&id| artifact.matrix_index(id))
        .map(|i| artifact.matrix_names[i].clone())
        .collect()
}

pub fn cluster(artifact: &AnalysisArtifact, k: usize, cluster_id: usize) -> Result<ClusterView> {
    let (members, medoid) = cluster_members(artifact, k, cluster_id)?;
    Ok(ClusterView {
        k,
        cluster_id,
        members: members.to_vec(),
        member_names: names_of(artifact, members),
        medoid,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct HeatmapView {
    pub matrix_ids: Vec<u64>,
    pub matrix_names: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

pub fn heatmap(artifact: &AnalysisArtifact, k: usize, cluster_id: usize) -> Result<HeatmapView> {
    let (members, _) = cluster_members(artifact, k, cluster_id)?;
    let mut indices = Vec::with_capacity(members.len());
    for &id in members {
        let idx = artifact
            .matrix_index(id)
            .ok_or_else(|| AnalysisError::NotFound(format!("matrix {}", id)))?;
        indices.push(idx);
    }
    let values = indices
        .iter()
        .map(|&i| {
            indices
                .iter()
                .map(|&j| artifact.correlation_matrix[i][j])
                .collect()
        })
        .collect();
    Ok(HeatmapView {
        matrix_ids: members.to_vec(),
        matrix_names: names_of(artifact, members),
        values,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct ScatterPoint {
    pub row_name: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScatterView {
    pub x_name: String,
    pub y_name: String,
    pub points: Vec<ScatterPoint>,
}

pub fn scatterplot(artifact: &AnalysisArtifact, x_index: usize, y_index: usize) -> Result<ScatterView> {
    let n = artifact.matrix_ids.len();
    for index in [x_index, y_index] {
        if index >= n {
            return Err(AnalysisError::InvalidParameter(format!(
                "matrix index {} out of range for {} matrices",
                index, n
            )));
        }
    }
    let xs = matrix_vector(artifact, artifact.matrix_ids[x_index])?;
    let ys = matrix_vector(artifact, artifact.matrix_ids[y_index])?;
    let points = artifact
        .row_names
        .iter()
        .zip(xs.iter().zip(ys))
        .map(|(name, (&x, &y))| ScatterPoint {
            row_name: name.clone(),
            x,
            y,
        })
        .collect();
    Ok(ScatterView {
        x_name: artifact.matrix_names[x_index].clone(),
        y_name: artifact.matrix_names[y_index].clone(),
        points,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct BoxplotView {
    pub matrix_name: String,
    pub groups: Vec<FiveNumber>,
}

pub fn boxplot(artifact: &AnalysisArtifact, matrix_name: &str, quantiles: usize) -> Result<BoxplotView> {
    let idx = artifact
        .matrix_index_by_name(matrix_name)
        .ok_or_else(|| AnalysisError::NotFound(format!("matrix '{}'", matrix_name)))?;
    let values = matrix_vector(artifact, artifact.matrix_ids[idx])?;
    let order = sort_vector(artifact, USER_SORT_VECTOR_ID)?;
    let groups = quantile_groups(order, quantiles)?
        .into_iter()
        .map(|group| {
            let sample: Vec<f64> = group.iter().map(|&i| values[i]).collect();
            stats::five_number(&sample)
        })
        .collect();
    Ok(BoxplotView {
        matrix_name: matrix_name.to_string(),
        groups,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureValue {
    pub matrix_id: u64,
    pub matrix_name: String,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureValuesView {
    pub row_name: String,
    pub row_index: usize,
    pub values: Vec<FeatureValue>,
}

pub fn feature_values(artifact: &AnalysisArtifact, row_name: &str) -> Result<FeatureValuesView> {
    let row_index = artifact
        .row_names
        .iter()
        .position(|r| r == row_name)
        .ok_or_else(|| AnalysisError::NotFound(format!("feature '{}'", row_name)))?;
    let mut values = Vec::with_capacity(artifact.matrix_ids.len());
    for (id, name) in artifact.matrix_ids.iter().zip(&artifact.matrix_names) {
        let vector = matrix_vector(artifact, *id)?;
        values.push(FeatureValue {
            matrix_id: *id,
            matrix_name: name.clone(),
            value: vector.get(row_index).copied().unwrap_or(0.0),
        });
    }
    Ok(FeatureValuesView {
        row_name: row_name.to_string(),
        row_index,
        values,
    })
}
