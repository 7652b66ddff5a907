use anyhow::{Context, Result};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

use crate::ctx::Ctx;
use crate::geometry::BinGeometry;
use crate::io::matrix_list::MatrixInput;
use crate::schema::v1::AnalysisArtifact;

pub mod stage0_scaffold;
pub mod stage1_matrices;
pub mod stage2_vectors;
pub mod stage3_correlation;
pub mod stage4_dendrogram;
pub mod stage5_clusters;
pub mod stage6_sort_orders;
pub mod stage7_output;

use stage0_scaffold::Stage0Scaffold;
use stage1_matrices::Stage1Matrices;
use stage2_vectors::Stage2Vectors;
use stage3_correlation::Stage3Correlation;
use stage4_dendrogram::Stage4Dendrogram;
use stage5_clusters::Stage5Clusters;
use stage6_sort_orders::Stage6SortOrders;
use stage7_output::Stage7Output;

pub trait Stage {
    fn name(&self) -> &'static str;
    fn run(&self, ctx: &mut Ctx) -> Result<()>;
}

pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    pub fn combine() -> Self {
        Self::new(vec![
            Box::new(Stage0Scaffold::new()),
            Box::new(Stage1Matrices::new()),
            Box::new(Stage2Vectors::new()),
            Box::new(Stage3Correlation::new()),
            Box::new(Stage4Dendrogram::new()),
            Box::new(Stage5Clusters::new()),
            Box::new(Stage6SortOrders::new()),
            Box::new(Stage7Output::new()),
        ])
    }

    pub fn run(&self, ctx: &mut Ctx) -> Result<()> {
        for stage in &self.stages {
            let start = Instant::now();
            info!(stage = stage.name(), "stage started");
            if let Err(err) = stage.run(ctx) {
                let elapsed_ms = start.elapsed().as_millis();
                warn!(
                    stage = stage.name(),
                    elapsed_ms = elapsed_ms as u64,
                    error = %err,
                    "stage failed"
                );
                return Err(err);
            }
            let elapsed_ms = start.elapsed().as_millis();
            info!(
                stage = stage.name(),
                elapsed_ms = elapsed_ms as u64,
                "stage finished"
            );
        }
        Ok(())
    }
}

pub fn combine(
    inputs: Vec<MatrixInput>,
    geometry: Option<BinGeometry>,
    sort_vector_text: Option<String>,
    artifact_path: &Path,
) -> Result<AnalysisArtifact> {
    let mut ctx = Ctx::new(inputs, artifact_path.to_path_buf());
    ctx.geometry = geometry;
    ctx.sort_vector_text = sort_vector_text;
    run_combine(&mut ctx)
}

pub fn run_combine(ctx: &mut Ctx) -> Result<AnalysisArtifact> {
    Pipeline::combine().run(ctx)?;
    for warning in &ctx.warnings {
        warn!(warning = %warning, "combine warning");
    }
    ctx.artifact.take().context("combine produced no artifact")
}
