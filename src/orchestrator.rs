use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs::File;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::countmatrix::{CacheKey, CountMatrixCache};
use crate::dataset::access::Owned;
use crate::dataset::{FeatureList, GenomicDataset, SignalSource, SortVector};
use crate::error::{AnalysisError, Result};
use crate::geometry::BinGeometry;
use crate::io::matrix_list::MatrixInput;
use crate::pipeline;
use crate::store::OutputStore;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisDataset {
    pub display_name: String,
    pub dataset: GenomicDataset,
    #[serde(default)]
    pub count_matrix_id: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisStatus {
    NotStarted,
    Running,
    Complete,
    Failed,
}

impl AnalysisStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotStarted => "NOT STARTED",
            Self::Running => "RUNNING",
            Self::Complete => "COMPLETE",
            Self::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
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
    pub sort_vector: Option<SortVector>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub failure: Option<String>,
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl Analysis {
    pub fn new(
        id: u64,
        name: &str,
        feature_list: FeatureList,
        datasets: Vec<AnalysisDataset>,
        geometry: BinGeometry,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            owner: None,
            public: false,
            feature_list,
            datasets,
            geometry,
            sort_vector: None,
            start_time: None,
            end_time: None,
            failure: None,
            output: None,
        }
    }

    // Derived from the timestamps; a recorded failure wins over RUNNING.
    pub fn status(&self) -> AnalysisStatus {
        match (self.start_time, self.end_time, &self.failure) {
            (None, _, _) => AnalysisStatus::NotStarted,
            (Some(_), Some(_), _) => AnalysisStatus::Complete,
            (Some(_), None, Some(_)) => AnalysisStatus::Failed,
            (Some(_), None, None) => AnalysisStatus::Running,
        }
    }

    pub fn count_matrix_ids(&self) -> Vec<u64> {
        self.datasets
            .iter()
            .filter_map(|d| d.count_matrix_id)
            .collect()
    }

    fn validate(&self) -> Result<()> {
        self.geometry.validate()?;
        if self.datasets.is_empty() {
            return Err(AnalysisError::InvalidParameter(format!(
                "analysis {} has no datasets",
                self.id
            )));
        }
        let mut seen = HashSet::new();
        for d in &self.datasets {
            if !seen.insert(d.dataset.dataset_id()) {
                return Err(AnalysisError::InvalidParameter(format!(
                    "analysis {} lists dataset {} twice",
                    self.id,
                    d.dataset.dataset_id()
                )));
            }
        }
        if let Some(sv) = &self.sort_vector {
            if sv.feature_list_id != self.feature_list.id {
                return Err(AnalysisError::InvalidParameter(format!(
                    "sort vector {} belongs to feature list {}, analysis uses {}",
                    sv.id, sv.feature_list_id, self.feature_list.id
                )));
            }
        }
        Ok(())
    }
}

impl Owned for Analysis {
    fn owner(&self) -> Option<u64> {
        self.owner
    }

    fn is_public(&self) -> bool {
        self.public
    }
}

struct Shared {
    analyses: Mutex<HashMap<u64, Analysis>>,
    cache: Arc<CountMatrixCache>,
    output_dir: PathBuf,
}

pub struct Orchestrator {
    shared: Arc<Shared>,
    pool: rayon::ThreadPool,
}

impl Orchestrator {
    pub fn new(cache: Arc<CountMatrixCache>, output_dir: &Path, threads: usize) -> Result<Self> {
        std::fs::create_dir_all(output_dir)?;
        let mut builder = rayon::ThreadPoolBuilder::new();
        if threads > 0 {
            builder = builder.num_threads(threads);
        }
        let pool = builder
            .build()
            .map_err(|e| std::io::Error::other(format!("failed to build thread pool: {}", e)))?;
        Ok(Self {
            shared: Arc::new(Shared {
                analyses: Mutex::new(HashMap::new()),
                cache,
                output_dir: output_dir.to_path_buf(),
            }),
            pool,
        })
    }

    pub fn cache(&self) -> &CountMatrixCache {
        &self.shared.cache
    }

    pub fn register(&self, analysis: Analysis) -> Result<()> {
        analysis.validate()?;
        let mut analyses = lock(&self.shared.analyses);
        if analyses.contains_key(&analysis.id) {
            return Err(AnalysisError::InvalidParameter(format!(
                "analysis {} already registered",
                analysis.id
            )));
        }
        info!(analysis = analysis.id, datasets = analysis.datasets.len(), "analysis_registered");
        analyses.insert(analysis.id, analysis);
        Ok(())
    }

    /// Submits the analysis unless it has already started. Returns whether a
    /// job was submitted by this call.
    pub fn execute(&self, id: u64) -> Result<bool> {
        {
            let mut analyses = lock(&self.shared.analyses);
            let analysis = analyses
                .get_mut(&id)
                .ok_or_else(|| AnalysisError::NotFound(format!("analysis {}", id)))?;
            if analysis.status() != AnalysisStatus::NotStarted {
                info!(analysis = id, status = %analysis.status(), "execute_ignored");
                return Ok(false);
            }
            analysis.start_time = Some(Utc::now());
        }
        let shared = Arc::clone(&self.shared);
        self.pool.spawn(move || run_job(&shared, id));
        info!(analysis = id, "analysis_submitted");
        Ok(true)
    }

    pub fn status(&self, id: u64) -> Result<AnalysisStatus> {
        lock(&self.shared.analyses)
            .get(&id)
            .map(Analysis::status)
            .ok_or_else(|| AnalysisError::NotFound(format!("analysis {}", id)))
    }

    pub fn analysis(&self, id: u64) -> Result<Analysis> {
        lock(&self.shared.analyses)
            .get(&id)
            .cloned()
            .ok_or_else(|| AnalysisError::NotFound(format!("analysis {}", id)))
    }

    pub fn wait(&self, id: u64, timeout: Duration) -> Result<AnalysisStatus> {
        let deadline = Instant::now() + timeout;
        loop {
            let status = self.status(id)?;
            if status.is_terminal() || Instant::now() >= deadline {
                return Ok(status);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    pub fn store(&self, id: u64) -> Result<OutputStore> {
        let analysis = self.analysis(id)?;
        OutputStore::open(completed_output(&analysis)?)
    }

    pub fn export<W: Write + Seek>(&self, id: u64, writer: W) -> Result<W> {
        let analysis = self.analysis(id)?;
        let output = completed_output(&analysis)?;
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut zip = ZipWriter::new(writer);
        add_file(&mut zip, "feature_list.txt", &analysis.feature_list.path, options)?;
        if let Some(sv) = &analysis.sort_vector {
            zip.start_file("sort_vector.txt", options)?;
            zip.write_all(sv.text.as_bytes())?;
        }
        add_file(&mut zip, "output.json", output, options)?;
        for entry in &analysis.datasets {
            let key = CacheKey::new(
                &analysis.feature_list,
                entry.dataset.dataset_id(),
                analysis.geometry,
            );
            let cm = self.shared.cache.get(&key).ok_or_else(|| {
                AnalysisError::NotFound(format!(
                    "count matrix for dataset {}",
                    entry.dataset.dataset_id()
                ))
            })?;
            let name = format!("count_matrix/{}.txt", entry.display_name);
            add_file(&mut zip, &name, &cm.path, options)?;
        }
        let writer = zip.finish()?;
        info!(analysis = id, matrices = analysis.datasets.len(), "analysis_exported");
        Ok(writer)
    }
}

fn completed_output(analysis: &Analysis) -> Result<&Path> {
    match (analysis.status(), &analysis.output) {
        (AnalysisStatus::Complete, Some(path)) => Ok(path.as_path()),
        (status, _) => Err(AnalysisError::AnalysisNotReady(format!(
            "analysis {} is {}",
            analysis.id, status
        ))),
    }
}

fn add_file<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    path: &Path,
    options: SimpleFileOptions,
) -> Result<()> {
    let mut file = File::open(path)?;
    zip.start_file(name, options)?;
    std::io::copy(&mut file, zip)?;
    Ok(())
}

fn run_job(shared: &Shared, id: u64) {
    let started = Instant::now();
    match run_analysis(shared, id) {
        Ok(path) => {
            let mut analyses = lock(&shared.analyses);
            if let Some(analysis) = analyses.get_mut(&id) {
                analysis.output = Some(path);
                analysis.end_time = Some(Utc::now());
            }
            info!(
                analysis = id,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "analysis_complete"
            );
        }
        Err(err) => {
            let message = format!("{:#}", err);
            error!(analysis = id, error = %message, "analysis_failed");
            if let Some(analysis) = lock(&shared.analyses).get_mut(&id) {
                analysis.failure = Some(message);
            }
        }
    }
}

// Builds (or fetches) one count matrix per dataset, then combines them. The
// artifact is durable on disk before this returns.
fn run_analysis(shared: &Shared, id: u64) -> anyhow::Result<PathBuf> {
    let snapshot = lock(&shared.analyses)
        .get(&id)
        .cloned()
        .ok_or_else(|| AnalysisError::NotFound(format!("analysis {}", id)))?;

    let mut inputs = Vec::with_capacity(snapshot.datasets.len());
    for (slot, entry) in snapshot.datasets.iter().enumerate() {
        let cm = shared
            .cache
            .get_or_build(&snapshot.feature_list, &entry.dataset, &snapshot.geometry)?;
        if let Some(analysis) = lock(&shared.analyses).get_mut(&id) {
            analysis.datasets[slot].count_matrix_id = Some(cm.id);
        }
        inputs.push(MatrixInput {
            id: cm.id,
            name: entry.display_name.clone(),
            path: cm.path,
        });
    }

    let path = shared.output_dir.join(format!("analysis-{}.json", id));
    let sort_vector_text = snapshot.sort_vector.map(|sv| sv.text);
    pipeline::combine(inputs, Some(snapshot.geometry), sort_vector_text, &path)?;
    Ok(path)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
