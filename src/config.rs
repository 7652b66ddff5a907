use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::dataset::{FeatureList, GenomicDataset, SortVector};
use crate::geometry::BinGeometry;
use crate::orchestrator::{Analysis, AnalysisDataset};
use crate::schema::v1::USER_SORT_VECTOR_ID;

// Analysis description read by `kira-binmatrix run`. Relative paths are
// resolved against the directory holding the description file.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_id")]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub owner: Option<u64>,
    #[serde(default)]
    pub public: bool,
    pub feature_list: FeatureList,
    pub datasets: Vec<AnalysisDataset>,
    #[serde(default)]
    pub geometry: BinGeometry,
    #[serde(default)]
    pub sort_vector_path: Option<PathBuf>,
    #[serde(default)]
    pub encode_root: Option<PathBuf>,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub threads: usize,
}

fn default_id() -> u64 {
    1
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}

impl AnalysisConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read analysis description {}", path.display()))?;
        let mut config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse analysis description {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_paths(base);
        config.geometry.validate()?;
        if config.datasets.is_empty() {
            bail!("{}: analysis needs at least one dataset", path.display());
        }
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() && !p.as_os_str().is_empty() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.feature_list.path);
        resolve(&mut self.cache_dir);
        resolve(&mut self.output_dir);
        if let Some(p) = self.sort_vector_path.as_mut() {
            resolve(p);
        }
        if let Some(p) = self.encode_root.as_mut() {
            resolve(p);
        }
        for entry in &mut self.datasets {
            if let GenomicDataset::User(d) = &mut entry.dataset {
                for p in [&mut d.data_ambiguous, &mut d.data_plus, &mut d.data_minus]
                    .into_iter()
                    .flatten()
                {
                    resolve(p);
                }
            }
        }
    }

    pub fn to_analysis(&self) -> Result<Analysis> {
        let datasets = self
            .datasets
            .iter()
            .cloned()
            .map(|mut entry| {
                if let Some(root) = &self.encode_root {
                    entry.dataset = entry.dataset.with_encode_root(root);
                }
                entry
            })
            .collect();
        let mut analysis = Analysis::new(
            self.id,
            &self.name,
            self.feature_list.clone(),
            datasets,
            self.geometry,
        );
        analysis.owner = self.owner;
        analysis.public = self.public;

        if let Some(path) = &self.sort_vector_path {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read sort vector {}", path.display()))?;
            analysis.sort_vector = Some(SortVector {
                id: USER_SORT_VECTOR_ID,
                name: path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or("sort_vector")
                    .to_string(),
                feature_list_id: self.feature_list.id,
                owner: self.owner,
                public: self.public,
                text,
            });
        }
        Ok(analysis)
    }
}
