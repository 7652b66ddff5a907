use anyhow::Result;
use tracing::info;

use crate::ctx::Ctx;
use crate::math::stats;
use crate::pipeline::Stage;

pub struct Stage3Correlation;

impl Stage3Correlation {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage3Correlation {
    fn name(&self) -> &'static str {
        "stage3_correlation"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let corr = stats::correlation_matrix(&ctx.vectors);
        ctx.max_abs_correlation = corr
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row.iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(_, r)| r.abs())
                    .fold(0.0, f64::max)
            })
            .collect();
        ctx.correlation = corr;
        info!(n = ctx.correlation.len(), "correlation_ready");
        Ok(())
    }
}
