use std::path::Path;

use tracing::{info, warn};

use crate::dataset::{FeatureList, SignalSource, TrackPaths};
use crate::error::Result;
use crate::geometry::{Anchor, BinGeometry};
use crate::io::features::{Feature, Strand, read_feature_list};
use crate::io::matrix::{BinnedMatrix, write_matrix};
use crate::io::signal::{SignalTrack, open_track};

pub enum DatasetTracks {
    Stranded {
        plus: Box<dyn SignalTrack>,
        minus: Box<dyn SignalTrack>,
    },
    Unstranded(Box<dyn SignalTrack>),
}

impl DatasetTracks {
    pub fn open(paths: &TrackPaths) -> Result<Self> {
        match paths {
            TrackPaths::Stranded { plus, minus } => Ok(Self::Stranded {
                plus: open_track(plus)?,
                minus: open_track(minus)?,
            }),
            TrackPaths::Unstranded { ambiguous } => Ok(Self::Unstranded(open_track(ambiguous)?)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BinReport {
    pub matrix: BinnedMatrix,
    // Features whose windows reached past the track bounds (or whose
    // chromosome the track lacks); the uncovered part counts as zero.
    pub clamped: usize,
}

// Bins signal around every feature. Rows follow feature order; column 0 is
// the most upstream bin relative to the feature's orientation.
pub fn bin_features(
    tracks: &mut DatasetTracks,
    features: &[Feature],
    stranded_features: bool,
    geometry: &BinGeometry,
) -> Result<BinReport> {
    geometry.validate()?;
    let n_bins = geometry.bin_number as usize;

    let mut row_names = Vec::with_capacity(features.len());
    let mut values = Vec::with_capacity(features.len());
    let mut clamped = 0usize;

    for feature in features {
        let strand = if stranded_features {
            feature.strand
        } else {
            Strand::Unknown
        };
        let windows = feature_windows(feature, strand, geometry);
        let mut row = vec![0.0f64; n_bins];

        let out_of_bounds = match tracks {
            DatasetTracks::Unstranded(track) => {
                accumulate(track.as_mut(), &feature.chrom, &windows, &mut row)?
            }
            DatasetTracks::Stranded { plus, minus } => match strand {
                Strand::Plus => accumulate(plus.as_mut(), &feature.chrom, &windows, &mut row)?,
                Strand::Minus => accumulate(minus.as_mut(), &feature.chrom, &windows, &mut row)?,
                Strand::Unknown => {
                    let a = accumulate(plus.as_mut(), &feature.chrom, &windows, &mut row)?;
                    let b = accumulate(minus.as_mut(), &feature.chrom, &windows, &mut row)?;
                    a || b
                }
            },
        };
        if out_of_bounds {
            clamped += 1;
        }

        row_names.push(feature.name.clone());
        values.push(row);
    }

    if clamped > 0 {
        warn!(clamped, "features clamped to track bounds");
    }

    Ok(BinReport {
        matrix: BinnedMatrix {
            bins: geometry.labels(),
            row_names,
            values,
        },
        clamped,
    })
}

pub fn build_matrix_file<S: SignalSource + ?Sized>(
    feature_list: &FeatureList,
    dataset: &S,
    geometry: &BinGeometry,
    out: &Path,
) -> Result<BinReport> {
    let features = read_feature_list(&feature_list.path)?;
    let paths = dataset.tracks()?;
    let mut tracks = DatasetTracks::open(&paths)?;
    let report = bin_features(&mut tracks, &features, feature_list.stranded, geometry)?;
    write_matrix(out, &report.matrix)?;
    info!(
        dataset = %dataset.dataset_id(),
        features = features.len(),
        bins = geometry.bin_number,
        out = %out.display(),
        "count_matrix_written"
    );
    Ok(report)
}

fn feature_windows(feature: &Feature, strand: Strand, geometry: &BinGeometry) -> Vec<(i64, i64)> {
    let start = feature.start as i64;
    let end = feature.end as i64;
    let minus = strand == Strand::Minus;
    let anchor = match geometry.anchor {
        Anchor::Start if minus => end,
        Anchor::Start => start,
        Anchor::End if minus => start,
        Anchor::End => end,
        Anchor::Center => (start + end) / 2,
    };
    let size = geometry.bin_size as i64;
    (0..geometry.bin_number as i64)
        .map(|j| {
            let offset = geometry.bin_start + j * size;
            if minus {
                (anchor - offset - size, anchor - offset)
            } else {
                (anchor + offset, anchor + offset + size)
            }
        })
        .collect()
}

// Adds |value| * overlap_bp of every interval into the overlapping columns.
// Returns true when part of the windows fell outside the track.
fn accumulate(
    track: &mut dyn SignalTrack,
    chrom: &str,
    windows: &[(i64, i64)],
    row: &mut [f64],
) -> Result<bool> {
    let span_lo = windows.iter().map(|w| w.0).min().unwrap_or(0);
    let span_hi = windows.iter().map(|w| w.1).max().unwrap_or(0);
    let Some(len) = track.chrom_len(chrom) else {
        return Ok(true);
    };
    let len = len as i64;
    let out_of_bounds = span_lo < 0 || span_hi > len;
    let lo = span_lo.max(0);
    let hi = span_hi.min(len);
    if lo >= hi {
        return Ok(true);
    }

    for iv in track.intervals(chrom, lo as u64, hi as u64)? {
        let value = iv.value as f64;
        if !value.is_finite() || value == 0.0 {
            continue;
        }
        let (s, e) = (iv.start as i64, iv.end as i64);
        for (j, &(wlo, whi)) in windows.iter().enumerate() {
            let overlap = e.min(whi) - s.max(wlo);
            if overlap > 0 {
                row[j] += value.abs() * overlap as f64;
            }
        }
    }
    Ok(out_of_bounds)
}
