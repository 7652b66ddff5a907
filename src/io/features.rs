use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{AnalysisError, Result};
use crate::io::open_maybe_gz;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strand {
    Plus,
    Minus,
    Unknown,
}

impl Strand {
    fn parse(field: &str) -> Self {
        match field {
            "+" => Self::Plus,
            "-" => Self::Minus,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub name: String,
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub strand: Strand,
}

pub fn read_feature_list(path: &Path) -> Result<Vec<Feature>> {
    let reader = open_maybe_gz(path)?;
    let mut reader = BufReader::new(reader);
    let source = path.display().to_string();

    let mut features = Vec::new();
    let mut line = String::new();
    let mut line_no = 0usize;
    while reader.read_line(&mut line)? > 0 {
        line_no += 1;
        let trimmed = line.trim_end();
        if trimmed.is_empty()
            || trimmed.starts_with('#')
            || trimmed.starts_with("track")
            || trimmed.starts_with("browser")
        {
            line.clear();
            continue;
        }
        features.push(parse_bed_line(trimmed, &source, line_no)?);
        line.clear();
    }

    if features.is_empty() {
        return Err(AnalysisError::InputFormat(format!(
            "{}: feature list is empty",
            source
        )));
    }
    Ok(features)
}

fn parse_bed_line(line: &str, source: &str, line_no: usize) -> Result<Feature> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 3 {
        return Err(AnalysisError::InputFormat(format!(
            "{}:{} BED record needs at least 3 fields",
            source, line_no
        )));
    }
    let coord = |field: &str, what: &str| {
        field.parse::<u64>().map_err(|_| {
            AnalysisError::InputFormat(format!(
                "{}:{} invalid {} '{}'",
                source, line_no, what, field
            ))
        })
    };
    let chrom = parts[0].to_string();
    let start = coord(parts[1], "start")?;
    let end = coord(parts[2], "end")?;
    if end < start {
        return Err(AnalysisError::InputFormat(format!(
            "{}:{} end {} is before start {}",
            source, line_no, end, start
        )));
    }
    let name = match parts.get(3) {
        Some(name) if *name != "." => name.to_string(),
        _ => format!("{}:{}-{}", chrom, start, end),
    };
    let strand = parts.get(5).map(|s| Strand::parse(s)).unwrap_or(Strand::Unknown);

    Ok(Feature {
        name,
        chrom,
        start,
        end,
        strand,
    })
}
