use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::Path;

use bigtools::BigWigRead;

use crate::error::{AnalysisError, Result};
use crate::io::open_maybe_gz;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalInterval {
    pub start: u64,
    pub end: u64,
    pub value: f32,
}

pub trait SignalTrack {
    fn chrom_len(&self, chrom: &str) -> Option<u64>;

    fn intervals(&mut self, chrom: &str, start: u64, end: u64) -> Result<Vec<SignalInterval>>;
}

pub fn open_track(path: &Path) -> Result<Box<dyn SignalTrack>> {
    if !path.exists() {
        return Err(AnalysisError::NotFound(format!(
            "signal track {}",
            path.display()
        )));
    }
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if name.ends_with(".bw") || name.ends_with(".bigwig") {
        Ok(Box::new(BigWigTrack::open(path)?))
    } else {
        Ok(Box::new(BedGraphTrack::open(path)?))
    }
}

type FetchFn = Box<dyn FnMut(&str, u32, u32) -> Result<Vec<SignalInterval>>>;

pub struct BigWigTrack {
    chroms: HashMap<String, u64>,
    fetch: FetchFn,
}

impl BigWigTrack {
    pub fn open(path: &Path) -> Result<Self> {
        let display = path.display().to_string();
        let mut reader = BigWigRead::open_file(&display).map_err(|e| {
            AnalysisError::InputFormat(format!("{}: cannot open bigWig: {}", display, e))
        })?;
        let chroms = reader
            .chroms()
            .iter()
            .map(|c| (c.name.clone(), c.length as u64))
            .collect();

        let fetch = move |chrom: &str, start: u32, end: u32| -> Result<Vec<SignalInterval>> {
            let iter = reader.get_interval(chrom, start, end).map_err(|e| {
                AnalysisError::InputFormat(format!("{}: bigWig query failed: {}", display, e))
            })?;
            let mut out = Vec::new();
            for value in iter {
                let value = value.map_err(|e| {
                    AnalysisError::InputFormat(format!("{}: bigWig block: {}", display, e))
                })?;
                out.push(SignalInterval {
                    start: value.start as u64,
                    end: value.end as u64,
                    value: value.value,
                });
            }
            Ok(out)
        };

        Ok(Self {
            chroms,
            fetch: Box::new(fetch),
        })
    }
}

impl SignalTrack for BigWigTrack {
    fn chrom_len(&self, chrom: &str) -> Option<u64> {
        self.chroms.get(chrom).copied()
    }

    fn intervals(&mut self, chrom: &str, start: u64, end: u64) -> Result<Vec<SignalInterval>> {
        let Some(len) = self.chrom_len(chrom) else {
            return Ok(Vec::new());
        };
        let end = end.min(len);
        if start >= end {
            return Ok(Vec::new());
        }
        (self.fetch)(chrom, start as u32, end as u32)
    }
}

// In-memory bedGraph (`chrom start end value`). A chromosome's length is
// taken as the end of its last interval.
#[derive(Debug, Default)]
pub struct BedGraphTrack {
    chroms: HashMap<String, Vec<SignalInterval>>,
}

impl BedGraphTrack {
    pub fn open(path: &Path) -> Result<Self> {
        let reader = open_maybe_gz(path)?;
        let mut reader = BufReader::new(reader);
        let source = path.display().to_string();

        let mut chroms: HashMap<String, Vec<SignalInterval>> = HashMap::new();
        let mut line = String::new();
        let mut line_no = 0usize;
        while reader.read_line(&mut line)? > 0 {
            line_no += 1;
            let trimmed = line.trim();
            if trimmed.is_empty()
                || trimmed.starts_with('#')
                || trimmed.starts_with("track")
                || trimmed.starts_with("browser")
            {
                line.clear();
                continue;
            }
            let parts: Vec<&str> = trimmed.split_whitespace().collect();
            if parts.len() < 4 {
                return Err(AnalysisError::InputFormat(format!(
                    "{}:{} bedGraph record needs 4 fields",
                    source, line_no
                )));
            }
            let bad = |what: &str| {
                AnalysisError::InputFormat(format!("{}:{} invalid {}", source, line_no, what))
            };
            let start: u64 = parts[1].parse().map_err(|_| bad("start"))?;
            let end: u64 = parts[2].parse().map_err(|_| bad("end"))?;
            let value: f32 = parts[3].parse().map_err(|_| bad("value"))?;
            if end <= start {
                return Err(bad("interval (end <= start)"));
            }
            chroms
                .entry(parts[0].to_string())
                .or_default()
                .push(SignalInterval { start, end, value });
            line.clear();
        }

        for intervals in chroms.values_mut() {
            intervals.sort_by_key(|iv| iv.start);
        }
        Ok(Self { chroms })
    }
}

impl SignalTrack for BedGraphTrack {
    fn chrom_len(&self, chrom: &str) -> Option<u64> {
        self.chroms
            .get(chrom)
            .map(|ivs| ivs.iter().map(|iv| iv.end).max().unwrap_or(0))
    }

    fn intervals(&mut self, chrom: &str, start: u64, end: u64) -> Result<Vec<SignalInterval>> {
        let Some(ivs) = self.chroms.get(chrom) else {
            return Ok(Vec::new());
        };
        // bedGraph intervals do not overlap, so ends are sorted along with starts.
        let first = ivs.partition_point(|iv| iv.end <= start);
        Ok(ivs[first..]
            .iter()
            .take_while(|iv| iv.start < end)
            .copied()
            .collect())
    }
}
