use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::ctx::Ctx;
use crate::error::AnalysisError;
use crate::io::write_json_atomic;
use crate::schema::v1::{AnalysisArtifact, Dendrogram, SCHEMA_VERSION};

pub fn build_artifact(ctx: &Ctx) -> Result<AnalysisArtifact> {
    let tree = ctx.dendrogram.as_ref().context("dendrogram missing")?;
    if ctx.vectors.len() != ctx.inputs.len() {
        bail!("row-sum vectors missing");
    }
    for v in ctx.vectors.iter().flatten() {
        if !v.is_finite() {
            bail!("non-finite value in row-sum vectors");
        }
    }

    let matrix_ids = ctx.matrix_ids();
    let ids_of = |indices: &[usize]| indices.iter().map(|&i| matrix_ids[i]).collect::<Vec<_>>();

    let mut cluster_members = BTreeMap::new();
    let mut cluster_medoids = BTreeMap::new();
    for (&k, set) in &ctx.clusters {
        cluster_members.insert(k, set.members.iter().map(|m| ids_of(m.as_slice())).collect());
        cluster_medoids.insert(k, ids_of(set.medoids.as_slice()));
    }

    let vectors = matrix_ids
        .iter()
        .copied()
        .zip(ctx.vectors.iter().cloned())
        .collect();

    Ok(AnalysisArtifact {
        tool: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        schema_version: SCHEMA_VERSION.to_string(),
        geometry: ctx.geometry,
        dendrogram: Dendrogram::from(tree),
        correlation_matrix: ctx.correlation.clone(),
        max_abs_correlation_values: ctx.max_abs_correlation.clone(),
        matrix_names: ctx.inputs.iter().map(|m| m.name.clone()).collect(),
        matrix_ids,
        cluster_members,
        cluster_medoids,
        sort_orders: ctx.sort_orders.clone(),
        bins: ctx.bins.clone(),
        row_names: ctx.row_names.clone(),
        vectors,
        sort_vector: ctx.user_vector.clone(),
    })
}

pub fn write_artifact(path: &Path, artifact: &AnalysisArtifact) -> Result<(), AnalysisError> {
    write_json_atomic(path, artifact)
}
