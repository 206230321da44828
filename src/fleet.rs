//! Fleet Dataset Loader
//!
//! Parses the fleet crack-length ground truth and stress-cycle histories
//! from CSV. Both tables share one layout:
//!
//! ```text
//! unit_0,unit_1,unit_2,...      <- header: one label per fleet unit
//! 81.2,77.9,90.4,...            <- one row per load cycle
//! ...
//! ```
//!
//! The stress table is transposed to `(units, cycles)` and exposed as a
//! `(units, cycles, 1)` batch for the recursive models. Only default parsing
//! is applied: a malformed value or a ragged row fails the whole load.
//!
//! # Usage
//!
//! ```ignore
//! use fleet_crack_rnn::fleet::FleetData;
//! use fleet_crack_rnn::types::Precision;
//!
//! let fleet = FleetData::load("aFleet_5yrs.csv", "SFleet_5yrs.csv", Precision::F32)?;
//! let batch = fleet.stress_batch();
//! ```

use ndarray::{Array2, Array3, ArrayView1, Axis};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::types::{BatchShape, Precision};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum FleetDataError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Empty file: {0}")]
    Empty(PathBuf),

    #[error("Parse error in {path} at line {line}, column {column}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Ragged row in {path} at line {line}: expected {expected} values, found {found}")]
    Ragged {
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Unit count mismatch: crack table has {crack_units} units, stress table has {stress_units}")]
    UnitMismatch { crack_units: usize, stress_units: usize },
}

// ============================================================================
// CSV Quote-Aware Parsing
// ============================================================================

/// Split a CSV line respecting quoted fields (handles commas inside quotes).
/// Returns owned strings because quoted fields need unquoting.
fn csv_split(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    // Check for escaped quote ("")
                    if chars.peek() == Some(&'"') {
                        current.push('"');
                        chars.next();
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

// ============================================================================
// Tables
// ============================================================================

/// A numeric CSV table: header labels plus `(rows, columns)` values.
#[derive(Debug, Clone)]
pub struct FleetTable {
    /// Column labels from the header row (one per fleet unit).
    pub labels: Vec<String>,
    /// Values, one row per cycle and one column per unit.
    pub values: Array2<f64>,
}

impl FleetTable {
    /// Read a table from disk, rounding every value to `precision`.
    pub fn read(path: impl AsRef<Path>, precision: Precision) -> Result<Self, FleetDataError> {
        let path = path.as_ref();
        let io_err = |source| FleetDataError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(io_err)?;
        let mut lines = BufReader::new(file).lines();

        let header = lines
            .next()
            .ok_or_else(|| FleetDataError::Empty(path.to_path_buf()))?
            .map_err(io_err)?;
        let labels: Vec<String> = csv_split(header.trim_start_matches('\u{feff}'))
            .into_iter()
            .map(|s| s.trim().to_string())
            .collect();
        let width = labels.len();

        let mut flat: Vec<f64> = Vec::new();
        let mut rows = 0usize;

        for (idx, line_result) in lines.enumerate() {
            let line_num = idx + 2;
            let line = line_result.map_err(io_err)?;
            if line.trim().is_empty() {
                continue;
            }

            let fields = csv_split(&line);
            if fields.len() != width {
                return Err(FleetDataError::Ragged {
                    path: path.to_path_buf(),
                    line: line_num,
                    expected: width,
                    found: fields.len(),
                });
            }

            for (col, field) in fields.iter().enumerate() {
                let value: f64 = field.trim().parse().map_err(|e: std::num::ParseFloatError| {
                    FleetDataError::Parse {
                        path: path.to_path_buf(),
                        line: line_num,
                        column: col + 1,
                        message: format!("'{}': {}", field.trim(), e),
                    }
                })?;
                flat.push(precision.quantize(value));
            }
            rows += 1;
        }

        if rows == 0 {
            return Err(FleetDataError::Empty(path.to_path_buf()));
        }

        let values = Array2::from_shape_vec((rows, width), flat).map_err(|e| FleetDataError::Parse {
            path: path.to_path_buf(),
            line: 1,
            column: 1,
            message: e.to_string(),
        })?;

        tracing::debug!(file = %path.display(), rows, columns = width, "Fleet table read");
        Ok(Self { labels, values })
    }
}

// ============================================================================
// Stress Batch
// ============================================================================

/// Stress histories laid out as `(units, cycles, 1)` for batch inference.
#[derive(Debug, Clone, PartialEq)]
pub struct StressBatch {
    data: Array3<f64>,
}

impl StressBatch {
    /// Reshape a `(units, cycles)` stress matrix into a single-feature batch.
    pub fn from_unit_major(stress: &Array2<f64>) -> Self {
        let (units, cycles) = stress.dim();
        let data = stress
            .clone()
            .into_shape((units, cycles, 1))
            .unwrap_or_else(|_| {
                // Non-standard layout (e.g. a transposed view); copy element-wise
                Array3::from_shape_fn((units, cycles, 1), |(u, c, _)| stress[[u, c]])
            });
        Self { data }
    }

    pub fn shape(&self) -> BatchShape {
        let (units, cycles, features) = self.data.dim();
        BatchShape { units, cycles, features }
    }

    /// Stress series of one unit over all cycles.
    pub fn unit_series(&self, unit: usize) -> ArrayView1<'_, f64> {
        self.data.index_axis(Axis(0), unit).index_axis_move(Axis(1), 0)
    }

    pub fn as_array(&self) -> &Array3<f64> {
        &self.data
    }
}

// ============================================================================
// Fleet Data
// ============================================================================

/// Summary of a loaded fleet.
#[derive(Debug, Clone)]
pub struct FleetInfo {
    pub crack_path: String,
    pub stress_path: String,
    pub units: usize,
    pub stress_cycles: usize,
    pub crack_rows: usize,
    pub precision: Precision,
}

/// Loaded fleet ready for inference.
#[derive(Debug, Clone)]
pub struct FleetData {
    /// Ground truth, `(cycles, units)`.
    crack_length: Array2<f64>,
    /// Stress histories, `(units, cycles)`.
    stress: Array2<f64>,
    unit_labels: Vec<String>,
    pub info: FleetInfo,
}

impl FleetData {
    /// Load both fleet tables.
    pub fn load(
        crack_csv: impl AsRef<Path>,
        stress_csv: impl AsRef<Path>,
        precision: Precision,
    ) -> Result<Self, FleetDataError> {
        let crack_csv = crack_csv.as_ref();
        let stress_csv = stress_csv.as_ref();

        let crack = FleetTable::read(crack_csv, precision)?;
        let stress = FleetTable::read(stress_csv, precision)?;

        let mut fleet = Self::from_tables(crack, stress)?;
        fleet.info.crack_path = crack_csv.display().to_string();
        fleet.info.stress_path = stress_csv.display().to_string();
        fleet.info.precision = precision;

        tracing::info!(
            units = fleet.info.units,
            cycles = fleet.info.stress_cycles,
            precision = %precision,
            "Fleet loaded"
        );
        Ok(fleet)
    }

    /// Build from already-parsed tables (both `(cycles, units)`).
    pub fn from_tables(crack: FleetTable, stress: FleetTable) -> Result<Self, FleetDataError> {
        let crack_units = crack.values.ncols();
        let stress_units = stress.values.ncols();
        if crack_units != stress_units {
            return Err(FleetDataError::UnitMismatch { crack_units, stress_units });
        }

        let stress_by_unit = stress.values.t().as_standard_layout().into_owned();
        let (units, stress_cycles) = stress_by_unit.dim();

        let info = FleetInfo {
            crack_path: String::new(),
            stress_path: String::new(),
            units,
            stress_cycles,
            crack_rows: crack.values.nrows(),
            precision: Precision::default(),
        };

        Ok(Self {
            crack_length: crack.values,
            stress: stress_by_unit,
            unit_labels: stress.labels,
            info,
        })
    }

    pub fn num_units(&self) -> usize {
        self.info.units
    }

    pub fn num_cycles(&self) -> usize {
        self.info.stress_cycles
    }

    pub fn unit_labels(&self) -> &[String] {
        &self.unit_labels
    }

    /// Stress histories as `(units, cycles)`.
    pub fn stress(&self) -> &Array2<f64> {
        &self.stress
    }

    /// Stress histories as a `(units, cycles, 1)` batch.
    pub fn stress_batch(&self) -> StressBatch {
        StressBatch::from_unit_major(&self.stress)
    }

    /// Ground-truth crack length at the last recorded cycle, per unit.
    pub fn final_crack_lengths(&self) -> Vec<f64> {
        self.crack_length
            .rows()
            .into_iter()
            .last()
            .map(|row| row.to_vec())
            .unwrap_or_default()
    }
}

/// Broadcast the initial crack length to a `(units, 1)` column.
pub fn initial_crack_column(units: usize, a0: f64, precision: Precision) -> Array2<f64> {
    Array2::from_elem((units, 1), precision.quantize(a0))
}
