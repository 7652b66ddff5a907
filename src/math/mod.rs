pub mod cluster;
pub mod reduce;
#[cfg(feature = "mt")]
pub mod reduce_mt;
pub mod sort;
pub mod stats;
