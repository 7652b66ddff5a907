pub mod binner;
pub mod cache;

pub use binner::{BinReport, DatasetTracks, bin_features, build_matrix_file};
pub use cache::{CacheKey, CountMatrix, CountMatrixCache};
