use anyhow::Result;
use tracing::info;

use crate::ctx::Ctx;
use crate::math::cluster;
use crate::pipeline::Stage;

pub struct Stage4Dendrogram;

impl Stage4Dendrogram {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for Stage4Dendrogram {
    fn name(&self) -> &'static str {
        "stage4_dendrogram"
    }

    fn run(&self, ctx: &mut Ctx) -> Result<()> {
        let dist: Vec<Vec<f64>> = ctx
            .correlation
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row.iter()
                    .enumerate()
                    .map(|(j, r)| if i == j { 0.0 } else { 1.0 - r.abs() })
                    .collect()
            })
            .collect();
        let tree = cluster::average_linkage(&dist);
        info!(merges = tree.merges.len(), "dendrogram_ready");
        ctx.dendrogram = Some(tree);
        Ok(())
    }
}
