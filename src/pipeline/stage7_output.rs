use anyhow::{Context, Result};
use tracing::info;

use crate::ctx::Ctx;
use crate::io::json_writer;
use crate::pipeline::Stage;

pub struct Stage7Output;

impl Stage7Output {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage7Output {
    fn name(&self) -> &'static str {
        "stage7_output"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let artifact = json_writer::build_artifact(ctx)?;
        json_writer::write_artifact(&ctx.output.artifact_path, &artifact).with_context(|| {
            format!(
                "failed to write artifact {}",
                ctx.output.artifact_path.display()
            )
        })?;
        info!(path = %ctx.output.artifact_path.display(), "artifact_written");
        ctx.artifact = Some(artifact);
        Ok(())
    }
}
