use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use crate::error::{AnalysisError, Result};
use crate::io::matrix_list::MatrixInput;
use crate::io::{open_maybe_gz, write_atomic};

#[derive(Debug, Clone, PartialEq)]
pub struct BinnedMatrix {
    pub bins: Vec<String>,
    pub row_names: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl BinnedMatrix {
    pub fn n_rows(&self) -> usize {
        self.row_names.len()
    }

    pub fn row_sums(&self) -> Vec<f64> {
        self.values.iter().map(|row| row.iter().sum()).collect()
    }
}

pub fn write_matrix(path: &Path, matrix: &BinnedMatrix) -> Result<()> {
    write_atomic(path, |w| {
        writeln!(w, "{}", matrix.bins.join("\t"))?;
        for (name, row) in matrix.row_names.iter().zip(&matrix.values) {
            write!(w, "{}", name)?;
            for v in row {
                write!(w, "\t{}", v)?;
            }
            writeln!(w)?;
        }
        Ok(())
    })
}

pub fn read_matrix(path: &Path) -> Result<BinnedMatrix> {
    let mut bins = Vec::new();
    let mut row_names = Vec::new();
    let mut values = Vec::new();
    for_each_row(
        path,
        |header| {
            bins = header.to_vec();
            Ok(())
        },
        |_, name, row| {
            row_names.push(name.to_string());
            values.push(row.to_vec());
            Ok(())
        },
    )?;
    Ok(BinnedMatrix {
        bins,
        row_names,
        values,
    })
}

pub fn read_header(path: &Path) -> Result<Vec<String>> {
    let reader = open_maybe_gz(path)?;
    let mut reader = BufReader::new(reader);
    let mut line = String::new();
    while reader.read_line(&mut line)? > 0 {
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.split_whitespace().map(str::to_string).collect());
        }
        line.clear();
    }
    Err(AnalysisError::InputFormat(format!(
        "{}: matrix file missing header",
        path.display()
    )))
}

// Streams a matrix file. `on_header` sees the bin labels before any row is
// parsed, so callers can reject a file without reading it in full; `f`
// receives `(row_index, name, values)`. Returns the number of rows.
pub fn for_each_row<H, F>(path: &Path, mut on_header: H, mut f: F) -> Result<usize>
where
    H: FnMut(&[String]) -> Result<()>,
    F: FnMut(usize, &str, &[f64]) -> Result<()>,
{
    let reader = open_maybe_gz(path)?;
    let mut reader = BufReader::new(reader);
    let source = path.display().to_string();

    let mut header: Option<Vec<String>> = None;
    let mut rows = 0usize;
    let mut values: Vec<f64> = Vec::new();
    let mut line = String::new();
    let mut line_no = 0usize;
    while reader.read_line(&mut line)? > 0 {
        line_no += 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            line.clear();
            continue;
        }
        let Some(bins) = &header else {
            let bins: Vec<String> = trimmed.split_whitespace().map(str::to_string).collect();
            on_header(&bins)?;
            header = Some(bins);
            line.clear();
            continue;
        };

        let mut parts = trimmed.split_whitespace();
        let name = parts.next().unwrap_or_default();
        values.clear();
        for field in parts {
            let v: f64 = field.parse().map_err(|_| {
                AnalysisError::InputFormat(format!(
                    "{}:{} invalid matrix value '{}'",
                    source, line_no, field
                ))
            })?;
            values.push(v);
        }
        if values.len() != bins.len() {
            return Err(AnalysisError::InputFormat(format!(
                "{}:{} row '{}' has {} values, header has {} bins",
                source,
                line_no,
                name,
                values.len(),
                bins.len()
            )));
        }
        f(rows, name, &values)?;
        rows += 1;
        line.clear();
    }

    if header.is_none() {
        return Err(AnalysisError::InputFormat(format!(
            "{}: matrix file missing header",
            source
        )));
    }
    Ok(rows)
}

const END_OF_MATRIX: &str = "<end of matrix>";

// Loads matrices in order, checking every header and row name against the
// first matrix (or `expected_bins` when given) while each file is read. The
// first disagreement aborts the whole load.
pub fn read_consistent(
    inputs: &[MatrixInput],
    expected_bins: Option<&[String]>,
) -> Result<Vec<BinnedMatrix>> {
    if inputs.is_empty() {
        return Err(AnalysisError::InconsistentMatrix(
            "no matrices given".to_string(),
        ));
    }
    let mut out: Vec<BinnedMatrix> = Vec::with_capacity(inputs.len());
    for input in inputs {
        let reference = out.first();
        let mut bins = Vec::new();
        let mut row_names = Vec::new();
        let mut values = Vec::new();

        let rows = for_each_row(
            &input.path,
            |header| {
                let expected = expected_bins.or(reference.map(|m| m.bins.as_slice()));
                if let Some(expected) = expected {
                    if header != expected {
                        return Err(AnalysisError::HeaderMismatch {
                            path: input.path.clone(),
                        });
                    }
                }
                bins = header.to_vec();
                Ok(())
            },
            |row, name, row_values| {
                if let Some(reference) = reference {
                    let expected = reference
                        .row_names
                        .get(row)
                        .map(String::as_str)
                        .unwrap_or(END_OF_MATRIX);
                    if expected != name {
                        return Err(AnalysisError::RowMismatch {
                            path: input.path.clone(),
                            row,
                            expected: expected.to_string(),
                            found: name.to_string(),
                        });
                    }
                }
                row_names.push(name.to_string());
                values.push(row_values.to_vec());
                Ok(())
            },
        )?;

        if rows == 0 {
            return Err(AnalysisError::InconsistentMatrix(format!(
                "{}: matrix has no rows",
                input.path.display()
            )));
        }
        if let Some(reference) = reference {
            if rows < reference.n_rows() {
                return Err(AnalysisError::RowMismatch {
                    path: input.path.clone(),
                    row: rows,
                    expected: reference.row_names[rows].clone(),
                    found: END_OF_MATRIX.to_string(),
                });
            }
        }
        out.push(BinnedMatrix {
            bins,
            row_names,
            values,
        });
    }
    Ok(out)
}
