pub mod access;

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum DatasetId {
    User(u64),
    Encode(u64),
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user-{}", id),
            Self::Encode(id) => write!(f, "encode-{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackPaths {
    Stranded { plus: PathBuf, minus: PathBuf },
    Unstranded { ambiguous: PathBuf },
}

impl TrackPaths {
    pub fn is_stranded(&self) -> bool {
        matches!(self, Self::Stranded { .. })
    }
}

pub trait SignalSource {
    fn dataset_id(&self) -> DatasetId;
    fn name(&self) -> &str;
    fn tracks(&self) -> Result<TrackPaths>;

    fn is_stranded(&self) -> bool {
        self.tracks().map(|t| t.is_stranded()).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDataset {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub owner: Option<u64>,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub data_ambiguous: Option<PathBuf>,
    #[serde(default)]
    pub data_plus: Option<PathBuf>,
    #[serde(default)]
    pub data_minus: Option<PathBuf>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub expiration_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeDataset {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub root: PathBuf,
    #[serde(default)]
    pub data_ambiguous: Option<PathBuf>,
    #[serde(default)]
    pub data_plus: Option<PathBuf>,
    #[serde(default)]
    pub data_minus: Option<PathBuf>,
    #[serde(default)]
    pub data_type: String,
    #[serde(default)]
    pub cell_type: String,
    #[serde(default)]
    pub antibody: String,
    #[serde(default)]
    pub rna_extract: String,
    #[serde(default)]
    pub treatment: String,
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub localization: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GenomicDataset {
    User(UserDataset),
    Encode(EncodeDataset),
}

impl SignalSource for UserDataset {
    fn dataset_id(&self) -> DatasetId {
        DatasetId::User(self.id)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn tracks(&self) -> Result<TrackPaths> {
        select_tracks(
            &self.name,
            self.data_ambiguous.as_deref(),
            self.data_plus.as_deref(),
            self.data_minus.as_deref(),
            None,
        )
    }
}

impl SignalSource for EncodeDataset {
    fn dataset_id(&self) -> DatasetId {
        DatasetId::Encode(self.id)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn tracks(&self) -> Result<TrackPaths> {
        select_tracks(
            &self.name,
            self.data_ambiguous.as_deref(),
            self.data_plus.as_deref(),
            self.data_minus.as_deref(),
            Some(&self.root),
        )
    }
}

impl SignalSource for GenomicDataset {
    fn dataset_id(&self) -> DatasetId {
        match self {
            Self::User(d) => d.dataset_id(),
            Self::Encode(d) => d.dataset_id(),
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::User(d) => d.name(),
            Self::Encode(d) => d.name(),
        }
    }

    fn tracks(&self) -> Result<TrackPaths> {
        match self {
            Self::User(d) => d.tracks(),
            Self::Encode(d) => d.tracks(),
        }
    }
}

impl GenomicDataset {
    pub fn with_encode_root(mut self, root: &Path) -> Self {
        if let Self::Encode(d) = &mut self {
            if d.root.as_os_str().is_empty() {
                d.root = root.to_path_buf();
            }
        }
        self
    }
}

// An empty ambiguous track means the dataset is stranded.
fn select_tracks(
    name: &str,
    ambiguous: Option<&Path>,
    plus: Option<&Path>,
    minus: Option<&Path>,
    root: Option<&Path>,
) -> Result<TrackPaths> {
    let resolve = |p: &Path| match root {
        Some(r) if p.is_relative() => r.join(p),
        _ => p.to_path_buf(),
    };
    fn present(p: Option<&Path>) -> Option<&Path> {
        p.filter(|p| !p.as_os_str().is_empty())
    }

    if let Some(ambiguous) = present(ambiguous) {
        return Ok(TrackPaths::Unstranded {
            ambiguous: resolve(ambiguous),
        });
    }
    match (present(plus), present(minus)) {
        (Some(plus), Some(minus)) => Ok(TrackPaths::Stranded {
            plus: resolve(plus),
            minus: resolve(minus),
        }),
        _ => Err(AnalysisError::InputFormat(format!(
            "dataset '{}' needs an ambiguous track or both plus and minus tracks",
            name
        ))),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureList {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub owner: Option<u64>,
    #[serde(default)]
    pub public: bool,
    #[serde(default = "default_stranded")]
    pub stranded: bool,
    pub path: PathBuf,
}

fn default_stranded() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortVector {
    pub id: u64,
    pub name: String,
    pub feature_list_id: u64,
    #[serde(default)]
    pub owner: Option<u64>,
    #[serde(default)]
    pub public: bool,
    pub text: String,
}
