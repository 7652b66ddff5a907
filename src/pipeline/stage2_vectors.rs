use anyhow::Result;
use tracing::info;

use crate::ctx::Ctx;
use crate::math::reduce;
use crate::pipeline::Stage;

pub struct Stage2Vectors;

impl Stage2Vectors {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage2Vectors {
    fn name(&self) -> &'static str {
        "stage2_vectors"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        ctx.vectors = reduce::row_sum_vectors(&ctx.matrices, ctx.threads)?;
        info!(vectors = ctx.vectors.len(), threads = ctx.threads, "row_sums_ready");
        Ok(())
    }
}
