use anyhow::Result;
use rayon::prelude::*;

use crate::io::matrix::BinnedMatrix;

pub fn row_sum_vectors_mt(matrices: &[BinnedMatrix], threads: usize) -> Result<Vec<Vec<f64>>> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if threads > 0 {
        builder = builder.num_threads(threads);
    }
    let pool = builder
        .build()
        .map_err(|e| anyhow::anyhow!("failed to build thread pool: {}", e))?;
    Ok(pool.install(|| matrices.par_iter().map(BinnedMatrix::row_sums).collect()))
}
