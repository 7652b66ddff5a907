use serde::{Deserialize, Serialize};

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

// Pearson correlation. Undefined correlations (constant input, length
// mismatch, fewer than two values) are reported as 0.
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.len() < 2 {
        return 0.0;
    }
    let ma = mean(a);
    let mb = mean(b);
    let mut cov = 0.0;
    let mut va = 0.0;
    let mut vb = 0.0;
    for (x, y) in a.iter().zip(b) {
        let dx = x - ma;
        let dy = y - mb;
        cov += dx * dy;
        va += dx * dx;
        vb += dy * dy;
    }
    if va == 0.0 || vb == 0.0 {
        return 0.0;
    }
    (cov / (va.sqrt() * vb.sqrt())).clamp(-1.0, 1.0)
}

pub fn correlation_matrix(vectors: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = vectors.len();
    let mut out = vec![vec![0.0; n]; n];
    for i in 0..n {
        out[i][i] = 1.0;
        for j in (i + 1)..n {
            let r = pearson(&vectors[i], &vectors[j]);
            out[i][j] = r;
            out[j][i] = r;
        }
    }
    out
}

pub fn zscore(values: &[f64]) -> Vec<f64> {
    let m = mean(values);
    let sd = std_dev(values);
    if sd == 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - m) / sd).collect()
}

pub fn whiten_columns(rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n_cols = rows.first().map(|r| r.len()).unwrap_or(0);
    let mut scale = vec![1.0; n_cols];
    for (c, s) in scale.iter_mut().enumerate() {
        let column: Vec<f64> = rows.iter().map(|r| r[c]).collect();
        let sd = std_dev(&column);
        if sd > 0.0 {
            *s = sd;
        }
    }
    rows.iter()
        .map(|r| r.iter().zip(&scale).map(|(v, s)| v / s).collect())
        .collect()
}

pub fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    quantile_sorted(values, 0.5)
}

pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FiveNumber {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

pub fn five_number(values: &[f64]) -> FiveNumber {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    FiveNumber {
        min: sorted.first().copied().unwrap_or(0.0),
        q1: quantile_sorted(&sorted, 0.25),
        median: quantile_sorted(&sorted, 0.5),
        q3: quantile_sorted(&sorted, 0.75),
        max: sorted.last().copied().unwrap_or(0.0),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KsResult {
    pub statistic: f64,
    pub p_value: f64,
}

// Two-sample Kolmogorov–Smirnov test. The p-value uses the asymptotic
// Kolmogorov distribution with the Stephens small-sample correction.
// Either sample empty gives statistic 0 and p-value 1.
pub fn ks_2samp(a: &[f64], b: &[f64]) -> KsResult {
    if a.is_empty() || b.is_empty() {
        return KsResult {
            statistic: 0.0,
            p_value: 1.0,
        };
    }
    let mut a_sorted = a.to_vec();
    let mut b_sorted = b.to_vec();
    a_sorted.sort_by(|x, y| x.total_cmp(y));
    b_sorted.sort_by(|x, y| x.total_cmp(y));

    let n_a = a_sorted.len();
    let n_b = b_sorted.len();
    let mut i = 0;
    let mut j = 0;
    let mut d_max: f64 = 0.0;
    // Step over every distinct value so ties move both ECDFs together.
    while i < n_a && j < n_b {
        let v = a_sorted[i].min(b_sorted[j]);
        while i < n_a && a_sorted[i] <= v {
            i += 1;
        }
        while j < n_b && b_sorted[j] <= v {
            j += 1;
        }
        let d = (i as f64 / n_a as f64 - j as f64 / n_b as f64).abs();
        d_max = d_max.max(d);
    }

    let m = n_a as f64;
    let n = n_b as f64;
    let en = (m * n / (m + n)).sqrt();
    let lambda = (en + 0.12 + 0.11 / en) * d_max;
    KsResult {
        statistic: d_max,
        p_value: kolmogorov_survival(lambda),
    }
}

fn kolmogorov_survival(lambda: f64) -> f64 {
    if lambda < 1e-3 {
        return 1.0;
    }
    let mut sum = 0.0;
    for k in 1..=100 {
        let kf = k as f64;
        let term = (-2.0 * kf * kf * lambda * lambda).exp();
        sum += if k % 2 == 1 { term } else { -term };
        if term < 1e-12 {
            break;
        }
    }
    (2.0 * sum).clamp(0.0, 1.0)
}
