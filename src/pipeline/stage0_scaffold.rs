use std::collections::HashSet;
use std::fs;

use anyhow::Result;
use tracing::info;

use crate::ctx::Ctx;
use crate::error::AnalysisError;
use crate::pipeline::Stage;

pub struct Stage0Scaffold;

impl Stage0Scaffold {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage0Scaffold {
    fn name(&self) -> &'static str {
        "stage0_scaffold"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        if ctx.inputs.is_empty() {
            return Err(AnalysisError::InconsistentMatrix("no matrices to combine".to_string()).into());
        }

        let mut seen = HashSet::new();
        for input in &ctx.inputs {
            if input.id == 0 {
                return Err(AnalysisError::InvalidParameter(format!(
                    "matrix '{}' uses reserved id 0",
                    input.name
                ))
                .into());
            }
            if !seen.insert(input.id) {
                return Err(AnalysisError::InvalidParameter(format!(
                    "duplicate matrix id {}",
                    input.id
                ))
                .into());
            }
        }

        if let Some(geometry) = &ctx.geometry {
            geometry.validate()?;
        }

        if !ctx.output.out_dir.as_os_str().is_empty() {
            fs::create_dir_all(&ctx.output.out_dir)?;
        }
        info!(
            out_dir = %ctx.output.out_dir.display(),
            matrices = ctx.inputs.len(),
            "output_dir_ready"
        );
        Ok(())
    }
}
