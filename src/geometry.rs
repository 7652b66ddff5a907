use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

pub const MIN_BIN_NUMBER: u32 = 50;
pub const MAX_BIN_NUMBER: u32 = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    Start,
    Center,
    End,
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Start => "start",
            Self::Center => "center",
            Self::End => "end",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct BinGeometry {
    pub anchor: Anchor,
    pub bin_start: i64,
    pub bin_number: u32,
    pub bin_size: u32,
}

impl Default for BinGeometry {
    fn default() -> Self {
        Self {
            anchor: Anchor::Center,
            bin_start: -2500,
            bin_number: 50,
            bin_size: 100,
        }
    }
}

impl BinGeometry {
    pub fn validate(&self) -> Result<()> {
        if !(MIN_BIN_NUMBER..=MAX_BIN_NUMBER).contains(&self.bin_number) {
            return Err(AnalysisError::InvalidParameter(format!(
                "bin_number must be in [{}, {}], got {}",
                MIN_BIN_NUMBER, MAX_BIN_NUMBER, self.bin_number
            )));
        }
        if self.bin_size == 0 {
            return Err(AnalysisError::InvalidParameter(
                "bin_size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn labels(&self) -> Vec<String> {
        (0..self.bin_number as i64)
            .map(|j| {
                let lo = self.bin_start + j * self.bin_size as i64;
                format!("{}:{}", lo, lo + self.bin_size as i64)
            })
            .collect()
    }

    pub fn canonical(&self) -> String {
        format!(
            "{}|{}|{}|{}",
            self.anchor, self.bin_start, self.bin_number, self.bin_size
        )
    }
}
