use anyhow::Result;
use tracing::info;

use crate::ctx::{ClusterSet, Ctx};
use crate::math::{cluster, stats};
use crate::pipeline::Stage;

pub const MIN_K: usize = 2;
pub const MAX_K: usize = 10;

pub struct Stage5Clusters;

impl Stage5Clusters {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage5Clusters {
    fn name(&self) -> &'static str {
        "stage5_clusters"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let points: Vec<Vec<f64>> = ctx.vectors.iter().map(|v| stats::zscore(v)).collect();
        let max_k = MAX_K.min(points.len());
        for k in MIN_K..=max_k {
            let km = cluster::kmeans(&points, k, ctx.seed)?;
            let set = cluster_set(&points, &km);
            info!(k, clusters = set.members.len(), iterations = km.n_iter, "kmeans_ready");
            ctx.clusters.insert(k, set);
        }
        if max_k < MIN_K {
            ctx.warnings
                .push("fewer than two matrices; flat clustering skipped".to_string());
        }
        Ok(())
    }
}

// Clusters are numbered by first member; the medoid is the member with the
// smallest 1 - |r| to its centroid, ties to the earliest member.
fn cluster_set(points: &[Vec<f64>], km: &cluster::KMeansResult) -> ClusterSet {
    let (labels, n_clusters) = cluster::compact_labels(&km.labels);
    let mut members = vec![Vec::new(); n_clusters];
    let mut centroid_of = vec![0usize; n_clusters];
    for (i, &label) in labels.iter().enumerate() {
        members[label].push(i);
        centroid_of[label] = km.labels[i];
    }

    let medoids = members
        .iter()
        .zip(&centroid_of)
        .map(|(group, &c)| {
            let centroid = &km.centroids[c];
            let mut best = (group[0], f64::INFINITY);
            for &m in group {
                let d = 1.0 - stats::pearson(&points[m], centroid).abs();
                if d < best.1 {
                    best = (m, d);
                }
            }
            best.0
        })
        .collect();

    ClusterSet { members, medoids }
}
