use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::geometry::{Anchor, BinGeometry};
use crate::store::ViewRequest;

#[derive(Debug, Parser)]
#[command(
    name = "kira-binmatrix",
    version,
    about = "Binned signal matrices, matrix clustering and derived views"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Bin one dataset's signal around every feature of a BED file
    Bin(BinArgs),
    /// Run a full analysis from a JSON description
    Run(RunArgs),
    /// Combine existing matrix files into an analysis artifact
    Combine(CombineArgs),
    /// Cluster features by summed signal across matrices
    ClusterFeatures(ClusterFeaturesArgs),
    /// Render one derived view of an analysis artifact as JSON
    View(ViewArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum AnchorArg {
    Start,
    Center,
    End,
}

impl From<AnchorArg> for Anchor {
    fn from(a: AnchorArg) -> Self {
        match a {
            AnchorArg::Start => Anchor::Start,
            AnchorArg::Center => Anchor::Center,
            AnchorArg::End => Anchor::End,
        }
    }
}

#[derive(Debug, Args)]
pub struct GeometryArgs {
    #[arg(long, value_enum, default_value_t = AnchorArg::Center)]
    pub anchor: AnchorArg,

    #[arg(long, default_value_t = -2500, allow_hyphen_values = true)]
    pub bin_start: i64,

    #[arg(long, default_value_t = 50, help = "Number of bins (50-250)")]
    pub bin_number: u32,

    #[arg(long, default_value_t = 100, help = "Bin width in bp")]
    pub bin_size: u32,
}

impl GeometryArgs {
    pub fn geometry(&self) -> BinGeometry {
        BinGeometry {
            anchor: self.anchor.into(),
            bin_start: self.bin_start,
            bin_number: self.bin_number,
            bin_size: self.bin_size,
        }
    }
}

#[derive(Debug, Args)]
pub struct BinArgs {
    #[arg(long, help = "Feature list (BED, optionally gzipped)")]
    pub features: PathBuf,

    #[arg(long, help = "Unstranded signal track (bigWig or bedGraph)")]
    pub ambiguous: Option<PathBuf>,

    #[arg(long, requires = "minus", help = "Plus-strand signal track")]
    pub plus: Option<PathBuf>,

    #[arg(long, requires = "plus", help = "Minus-strand signal track")]
    pub minus: Option<PathBuf>,

    #[arg(long, default_value_t = false, help = "Ignore feature strand")]
    pub unstranded_features: bool,

    #[command(flatten)]
    pub geometry: GeometryArgs,

    #[arg(long)]
    pub out: PathBuf,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[arg(long, help = "Analysis description JSON")]
    pub config: PathBuf,

    #[arg(long, default_value_t = 3600, help = "Seconds to wait for completion")]
    pub timeout_secs: u64,

    #[arg(long, help = "Write a zip of the inputs and artifact after completion")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CombineArgs {
    #[arg(long, help = "Matrix list: one 'id name path' entry per line")]
    pub list: PathBuf,

    #[arg(long, help = "Sort vector file, one value per feature")]
    pub sort_vector: Option<PathBuf>,

    #[arg(long, default_value_t = 0, help = "Number of threads (0 = auto)")]
    pub threads: usize,

    #[arg(long)]
    pub out: PathBuf,
}

#[derive(Debug, Args)]
pub struct ClusterFeaturesArgs {
    #[arg(long, help = "Matrix list: one 'id name path' entry per line")]
    pub list: PathBuf,

    #[arg(long)]
    pub out: PathBuf,
}

#[derive(Debug, Args)]
pub struct ViewArgs {
    #[arg(long, help = "Analysis artifact JSON")]
    pub artifact: PathBuf,

    #[command(subcommand)]
    pub view: ViewCommand,
}

#[derive(Debug, Subcommand)]
pub enum ViewCommand {
    Summary,
    SortVector {
        #[arg(long)]
        id: u64,
    },
    Ks {
        #[arg(long)]
        matrix_id: u64,
        #[arg(long, default_value_t = 0)]
        vector_id: u64,
        #[arg(long, default_value_t = 4)]
        quantiles: usize,
    },
    KsBetween {
        #[arg(long)]
        a: u64,
        #[arg(long)]
        b: u64,
    },
    Cluster {
        #[arg(long)]
        k: usize,
        #[arg(long)]
        cluster_id: usize,
    },
    Heatmap {
        #[arg(long)]
        k: usize,
        #[arg(long)]
        cluster_id: usize,
    },
    Scatterplot {
        #[arg(long)]
        x_index: usize,
        #[arg(long)]
        y_index: usize,
    },
    Boxplot {
        #[arg(long)]
        matrix_name: String,
        #[arg(long, default_value_t = 4)]
        quantiles: usize,
    },
    FeatureValues {
        #[arg(long)]
        row_name: String,
    },
}

impl From<ViewCommand> for ViewRequest {
    fn from(cmd: ViewCommand) -> Self {
        match cmd {
            ViewCommand::Summary => Self::Summary,
            ViewCommand::SortVector { id } => Self::SortVector { id },
            ViewCommand::Ks {
                matrix_id,
                vector_id,
                quantiles,
            } => Self::Ks {
                matrix_id,
                vector_id,
                quantiles,
            },
            ViewCommand::KsBetween { a, b } => Self::KsBetween { a, b },
            ViewCommand::Cluster { k, cluster_id } => Self::Cluster { k, cluster_id },
            ViewCommand::Heatmap { k, cluster_id } => Self::Heatmap { k, cluster_id },
            ViewCommand::Scatterplot { x_index, y_index } => Self::Scatterplot { x_index, y_index },
            ViewCommand::Boxplot {
                matrix_name,
                quantiles,
            } => Self::Boxplot {
                matrix_name,
                quantiles,
            },
            ViewCommand::FeatureValues { row_name } => Self::FeatureValues { row_name },
        }
    }
}
