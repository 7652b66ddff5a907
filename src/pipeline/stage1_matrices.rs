use anyhow::Result;
use tracing::info;

use crate::ctx::Ctx;
use crate::io::matrix;
use crate::pipeline::Stage;

pub struct Stage1Matrices;

impl Stage1Matrices {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage1Matrices {
    fn name(&self) -> &'static str {
        "stage1_matrices"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let expected = ctx.geometry.map(|g| g.labels());
        let matrices = matrix::read_consistent(&ctx.inputs, expected.as_deref())?;

        let first = &matrices[0];
        ctx.bins = first.bins.clone();
        ctx.row_names = first.row_names.clone();
        info!(
            matrices = matrices.len(),
            rows = ctx.row_names.len(),
            bins = ctx.bins.len(),
            "matrices_loaded"
        );
        ctx.matrices = matrices;
        Ok(())
    }
}
