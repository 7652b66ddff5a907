pub mod cli;
pub mod cluster_features;
pub mod config;
pub mod countmatrix;
pub mod ctx;
pub mod dataset;
pub mod error;
pub mod geometry;
pub mod io;
pub mod math;
pub mod orchestrator;
pub mod pipeline;
pub mod schema;
pub mod store;

pub use error::{AnalysisError, Result};
