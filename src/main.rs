use anyhow::{Context, Result, bail};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use kira_binmatrix::cli::{
    BinArgs, Cli, ClusterFeaturesArgs, CombineArgs, Commands, RunArgs, ViewArgs,
};
use kira_binmatrix::cluster_features;
use kira_binmatrix::config::AnalysisConfig;
use kira_binmatrix::countmatrix::{CountMatrixCache, build_matrix_file};
use kira_binmatrix::ctx::Ctx;
use kira_binmatrix::dataset::{FeatureList, UserDataset};
use kira_binmatrix::io;
use kira_binmatrix::io::matrix_list::read_matrix_list;
use kira_binmatrix::orchestrator::{AnalysisStatus, Orchestrator};
use kira_binmatrix::pipeline;
use kira_binmatrix::store::{OutputStore, ViewRequest};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Bin(args) => handle_bin(args),
        Commands::Run(args) => handle_run(args),
        Commands::Combine(args) => handle_combine(args),
        Commands::ClusterFeatures(args) => handle_cluster_features(args),
        Commands::View(args) => handle_view(args),
    }
}

fn handle_bin(args: BinArgs) -> Result<()> {
    if args.ambiguous.is_none() && args.plus.is_none() {
        bail!("bin requires --ambiguous or both --plus and --minus");
    }
    let feature_list = FeatureList {
        id: 0,
        name: file_label(&args.features),
        owner: None,
        public: false,
        stranded: !args.unstranded_features,
        path: args.features.clone(),
    };
    let dataset = UserDataset {
        id: 0,
        name: file_label(&args.out),
        owner: None,
        public: false,
        data_ambiguous: args.ambiguous,
        data_plus: args.plus,
        data_minus: args.minus,
        url: None,
        expiration_date: None,
    };
    let geometry = args.geometry.geometry();
    geometry.validate()?;
    let report = build_matrix_file(&feature_list, &dataset, &geometry, &args.out)
        .with_context(|| format!("failed to bin {}", args.features.display()))?;
    println!(
        "kira-binmatrix bin ok: {} features x {} bins -> {}",
        report.matrix.n_rows(),
        geometry.bin_number,
        args.out.display()
    );
    if report.clamped > 0 {
        println!("warnings:");
        println!("- {} features clamped to track bounds", report.clamped);
    }
    Ok(())
}

fn handle_run(args: RunArgs) -> Result<()> {
    let config = AnalysisConfig::load(&args.config)?;
    let analysis = config.to_analysis()?;
    let id = analysis.id;

    let cache = Arc::new(CountMatrixCache::open(&config.cache_dir)?);
    let orchestrator = Orchestrator::new(cache, &config.output_dir, config.threads)?;
    orchestrator.register(analysis)?;
    orchestrator.execute(id)?;

    let status = orchestrator.wait(id, Duration::from_secs(args.timeout_secs))?;
    match status {
        AnalysisStatus::Complete => {
            let store = orchestrator.store(id)?;
            print!("{}", io::summary::format_summary(store.artifact()?));
            println!("artifact: {}", store.path().display());
            if let Some(path) = &args.export {
                let file = std::fs::File::create(path)
                    .with_context(|| format!("failed to create {}", path.display()))?;
                orchestrator.export(id, file)?;
                println!("export: {}", path.display());
            }
            Ok(())
        }
        AnalysisStatus::Failed => {
            let failure = orchestrator.analysis(id)?.failure.unwrap_or_default();
            bail!("analysis {} failed: {}", id, failure)
        }
        other => bail!("analysis {} still {} after {}s", id, other, args.timeout_secs),
    }
}

fn handle_combine(args: CombineArgs) -> Result<()> {
    let inputs = read_matrix_list(&args.list)?;
    let sort_vector_text = match &args.sort_vector {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read sort vector {}", path.display()))?,
        ),
        None => None,
    };

    let mut ctx = Ctx::new(inputs, args.out.clone());
    ctx.sort_vector_text = sort_vector_text;
    ctx.threads = args.threads;
    let artifact = pipeline::run_combine(&mut ctx)?;

    print!("{}", io::summary::format_summary(&artifact));
    if !ctx.warnings.is_empty() {
        println!("warnings:");
        for warning in &ctx.warnings {
            println!("- {}", warning);
        }
    }
    Ok(())
}

fn handle_cluster_features(args: ClusterFeaturesArgs) -> Result<()> {
    let bundle = cluster_features::cluster_features_from_list(&args.list)?;
    cluster_features::write_bundle(&args.out, &bundle)?;
    println!(
        "kira-binmatrix cluster-features ok: {} features, k = {:?} -> {}",
        bundle.row_names.len(),
        bundle.kmeans_results.keys().collect::<Vec<_>>(),
        args.out.display()
    );
    Ok(())
}

fn handle_view(args: ViewArgs) -> Result<()> {
    let store = OutputStore::open(&args.artifact)?;
    let request = ViewRequest::from(args.view);
    let value = store.render(&request)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn file_label(path: &std::path::Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("input")
        .to_string()
}
