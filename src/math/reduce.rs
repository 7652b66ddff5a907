use crate::io::matrix::BinnedMatrix;
#[cfg(feature = "mt")]
use crate::math::reduce_mt;

pub fn row_sum_vectors(matrices: &[BinnedMatrix], threads: usize) -> anyhow::Result<Vec<Vec<f64>>> {
    #[cfg(feature = "mt")]
    {
        if threads != 1 && matrices.len() > 1 {
            return reduce_mt::row_sum_vectors_mt(matrices, threads);
        }
    }
    #[cfg(not(feature = "mt"))]
    let _ = threads;

    Ok(matrices.iter().map(BinnedMatrix::row_sums).collect())
}
