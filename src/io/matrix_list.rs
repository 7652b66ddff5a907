use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::io::open_maybe_gz;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixInput {
    pub id: u64,
    pub name: String,
    pub path: PathBuf,
}

pub fn read_matrix_list(path: &Path) -> Result<Vec<MatrixInput>> {
    let reader = open_maybe_gz(path)?;
    let mut reader = BufReader::new(reader);
    let source = path.display().to_string();

    let mut entries = Vec::new();
    let mut line = String::new();
    let mut line_no = 0usize;
    while reader.read_line(&mut line)? > 0 {
        line_no += 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            line.clear();
            continue;
        }
        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        if parts.len() != 3 {
            return Err(AnalysisError::InputFormat(format!(
                "{}:{} matrix list entry must have 3 fields: id name path",
                source, line_no
            )));
        }
        let id: u64 = parts[0].parse().map_err(|_| {
            AnalysisError::InputFormat(format!(
                "{}:{} invalid matrix id '{}'",
                source, line_no, parts[0]
            ))
        })?;
        entries.push(MatrixInput {
            id,
            name: parts[1].to_string(),
            path: PathBuf::from(parts[2]),
        });
        line.clear();
    }

    if entries.is_empty() {
        return Err(AnalysisError::InputFormat(format!(
            "{}: matrix list is empty",
            source
        )));
    }
    Ok(entries)
}
