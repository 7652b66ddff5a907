use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

pub const DEFAULT_SEED: u64 = 42;
const MAX_ITER: usize = 300;
const TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct KMeansResult {
    pub centroids: Vec<Vec<f64>>,
    pub labels: Vec<usize>,
    pub inertia: f64,
    pub n_iter: usize,
}

// Lloyd's algorithm with k-means++ seeding from a fixed-seed RNG, so the
// same input always yields the same labels.
pub fn kmeans(data: &[Vec<f64>], k: usize, seed: u64) -> Result<KMeansResult> {
    let n = data.len();
    if k == 0 || k > n {
        return Err(AnalysisError::InvalidParameter(format!(
            "k-means needs 1 <= k <= n_points (k={}, n={})",
            k, n
        )));
    }
    let dim = data[0].len();
    if data.iter().any(|row| row.len() != dim) {
        return Err(AnalysisError::InvalidParameter(
            "k-means points have differing dimensions".to_string(),
        ));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut centroids = init_plus_plus(data, k, &mut rng);
    let mut labels = vec![0usize; n];
    let mut n_iter = 0;

    for iter in 0..MAX_ITER {
        n_iter = iter + 1;
        for (i, point) in data.iter().enumerate() {
            labels[i] = nearest(point, &centroids).0;
        }

        let mut sums = vec![vec![0.0; dim]; k];
        let mut counts = vec![0usize; k];
        for (point, &label) in data.iter().zip(&labels) {
            counts[label] += 1;
            for (s, v) in sums[label].iter_mut().zip(point) {
                *s += v;
            }
        }

        let mut shift: f64 = 0.0;
        for c in 0..k {
            // Empty clusters keep their previous centroid.
            if counts[c] == 0 {
                continue;
            }
            let updated: Vec<f64> = sums[c].iter().map(|s| s / counts[c] as f64).collect();
            shift = shift.max(sq_euclidean(&updated, &centroids[c]));
            centroids[c] = updated;
        }
        if shift <= TOLERANCE {
            break;
        }
    }

    let mut inertia = 0.0;
    for (i, point) in data.iter().enumerate() {
        let (label, d) = nearest(point, &centroids);
        labels[i] = label;
        inertia += d;
    }

    Ok(KMeansResult {
        centroids,
        labels,
        inertia,
        n_iter,
    })
}

fn init_plus_plus(data: &[Vec<f64>], k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let n = data.len();
    let mut chosen = vec![rng.random_range(0..n)];
    while chosen.len() < k {
        let dists: Vec<f64> = data
            .iter()
            .map(|p| {
                chosen
                    .iter()
                    .map(|&c| sq_euclidean(p, &data[c]))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();
        let total: f64 = dists.iter().sum();
        let next = if total > 0.0 {
            let mut target = rng.random::<f64>() * total;
            let mut pick = n - 1;
            for (i, d) in dists.iter().enumerate() {
                if *d <= 0.0 {
                    continue;
                }
                if target < *d {
                    pick = i;
                    break;
                }
                target -= d;
            }
            pick
        } else {
            // All remaining points coincide with a centroid.
            (0..n).find(|i| !chosen.contains(i)).unwrap_or(0)
        };
        chosen.push(next);
    }
    chosen.into_iter().map(|i| data[i].clone()).collect()
}

fn nearest(point: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    let mut best = (0usize, f64::INFINITY);
    for (c, centroid) in centroids.iter().enumerate() {
        let d = sq_euclidean(point, centroid);
        if d < best.1 {
            best = (c, d);
        }
    }
    best
}

fn sq_euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

pub fn compact_labels(labels: &[usize]) -> (Vec<usize>, usize) {
    let mut mapping: Vec<(usize, usize)> = Vec::new();
    let mut out = Vec::with_capacity(labels.len());
    for &label in labels {
        let next = match mapping.iter().find(|(old, _)| *old == label) {
            Some(&(_, new)) => new,
            None => {
                let new = mapping.len();
                mapping.push((label, new));
                new
            }
        };
        out.push(next);
    }
    (out, mapping.len())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Merge {
    pub left: usize,
    pub right: usize,
    pub distance: f64,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dendrogram {
    pub merges: Vec<Merge>,
    pub leaves: Vec<usize>,
}

// Average-linkage (UPGMA) agglomerative clustering of a full symmetric
// distance matrix. Ties resolve to the first pair in scan order.
pub fn average_linkage(dist: &[Vec<f64>]) -> Dendrogram {
    let n = dist.len();
    if n == 0 {
        return Dendrogram::default();
    }

    let mut d: Vec<Vec<f64>> = dist.to_vec();
    // Slot -> (cluster id, size) for clusters still active.
    let mut slots: Vec<Option<(usize, usize)>> = (0..n).map(|i| Some((i, 1))).collect();
    let mut merges = Vec::with_capacity(n.saturating_sub(1));

    for step in 0..n.saturating_sub(1) {
        let mut best = (0usize, 0usize, f64::INFINITY);
        for a in 0..n {
            if slots[a].is_none() {
                continue;
            }
            for b in (a + 1)..n {
                if slots[b].is_none() {
                    continue;
                }
                if d[a][b] < best.2 {
                    best = (a, b, d[a][b]);
                }
            }
        }
        let (a, b, distance) = best;
        let (id_a, size_a) = slots[a].unwrap_or((a, 1));
        let (id_b, size_b) = slots[b].unwrap_or((b, 1));

        for c in 0..n {
            if c == a || c == b || slots[c].is_none() {
                continue;
            }
            let merged = (d[a][c] * size_a as f64 + d[b][c] * size_b as f64)
                / (size_a + size_b) as f64;
            d[a][c] = merged;
            d[c][a] = merged;
        }

        let (left, right) = if id_a < id_b { (id_a, id_b) } else { (id_b, id_a) };
        merges.push(Merge {
            left,
            right,
            distance,
            size: size_a + size_b,
        });
        slots[a] = Some((n + step, size_a + size_b));
        slots[b] = None;
    }

    let leaves = leaf_order(n, &merges);
    Dendrogram { merges, leaves }
}

fn leaf_order(n: usize, merges: &[Merge]) -> Vec<usize> {
    if merges.is_empty() {
        return (0..n).collect();
    }
    let mut out = Vec::with_capacity(n);
    let mut stack = vec![n + merges.len() - 1];
    while let Some(node) = stack.pop() {
        if node < n {
            out.push(node);
        } else {
            let m = &merges[node - n];
            stack.push(m.right);
            stack.push(m.left);
        }
    }
    out
}
