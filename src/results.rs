//! Analysis results as returned by the backend.
//!
//! Records are decoded from the backend's JSON field names (`desc`, `gc`,
//! `n_orfs`, `seq_len`, `phred_score`, `result_type`) and checked once on
//! arrival, so everything downstream can rely on the invariants:
//! - `gc` lies in `[0, 1]`
//! - a PHRED total is present for FASTQ records and absent for FASTA records

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Declared type of a result record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResultType {
    Fastq,
    Fasta,
    /// A type this front end has no renderer for
    Unknown(String),
}

impl From<String> for ResultType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "fastq" => ResultType::Fastq,
            "fasta" => ResultType::Fasta,
            _ => ResultType::Unknown(value),
        }
    }
}

impl From<ResultType> for String {
    fn from(value: ResultType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ResultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultType::Fastq => f.write_str("fastq"),
            ResultType::Fasta => f.write_str("fasta"),
            ResultType::Unknown(other) => f.write_str(other),
        }
    }
}

/// Per-record analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: String,
    pub result_type: ResultType,
    #[serde(rename = "desc", default)]
    pub description: String,
    pub is_valid: bool,
    #[serde(rename = "seq_len")]
    pub sequence_length: usize,
    /// GC fraction; the backend reports `null` (NaN) for empty sequences
    #[serde(rename = "gc", deserialize_with = "null_as_zero")]
    pub gc_fraction: f64,
    #[serde(rename = "n_orfs")]
    pub orf_count: usize,
    /// Sum of PHRED scores over the record
    #[serde(
        rename = "phred_score",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub phred_total: Option<u64>,
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

impl AnalysisResult {
    /// Builds a valid FASTQ record.
    pub fn fastq(
        id: impl Into<String>,
        sequence_length: usize,
        gc_fraction: f64,
        orf_count: usize,
        phred_total: u64,
    ) -> Self {
        Self {
            id: id.into(),
            result_type: ResultType::Fastq,
            description: String::new(),
            is_valid: true,
            sequence_length,
            gc_fraction,
            orf_count,
            phred_total: Some(phred_total),
        }
    }

    /// Builds a valid FASTA record.
    pub fn fasta(
        id: impl Into<String>,
        sequence_length: usize,
        gc_fraction: f64,
        orf_count: usize,
    ) -> Self {
        Self {
            id: id.into(),
            result_type: ResultType::Fasta,
            description: String::new(),
            is_valid: true,
            sequence_length,
            gc_fraction,
            orf_count,
            phred_total: None,
        }
    }

    /// Average PHRED score per base. Only defined for FASTQ records.
    pub fn phred_score_per_base(&self) -> Option<f64> {
        if self.result_type != ResultType::Fastq {
            return None;
        }
        let total = self.phred_total?;
        if self.sequence_length == 0 {
            Some(0.0)
        } else {
            Some(total as f64 / self.sequence_length as f64)
        }
    }

    fn check(&self) -> Result<(), ResultError> {
        if !(0.0..=1.0).contains(&self.gc_fraction) {
            return Err(ResultError::GcOutOfRange {
                id: self.id.clone(),
                gc: self.gc_fraction,
            });
        }
        match (&self.result_type, self.phred_total) {
            (ResultType::Fastq, None) => Err(ResultError::MissingPhred {
                id: self.id.clone(),
            }),
            (ResultType::Fasta, Some(_)) => Err(ResultError::UnexpectedPhred {
                id: self.id.clone(),
            }),
            _ => Ok(()),
        }
    }
}

/// A record that breaks the result invariants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResultError {
    #[error("record {id}: GC fraction {gc} is outside [0, 1]")]
    GcOutOfRange { id: String, gc: f64 },

    #[error("record {id}: FASTQ result without a PHRED score")]
    MissingPhred { id: String },

    #[error("record {id}: FASTA result carries a PHRED score")]
    UnexpectedPhred { id: String },
}

/// Errors while writing results to disk.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Could not save results to {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Ordered results of one request, in backend response order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultCollection {
    records: Vec<AnalysisResult>,
}

impl ResultCollection {
    /// Validates and wraps decoded records.
    pub fn from_records(records: Vec<AnalysisResult>) -> Result<Self, ResultError> {
        records.iter().try_for_each(AnalysisResult::check)?;
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&AnalysisResult> {
        self.records.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnalysisResult> {
        self.records.iter()
    }

    /// Writes the results as pretty JSON to `dir/results-<random>.json`.
    pub fn save_json(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let dest = dir.join(format!("results-{:08x}.json", rand::random::<u32>()));
        let json = serde_json::to_string_pretty(&self.records)?;

        let io_err = |source| ExportError::Io {
            path: dest.clone(),
            source,
        };
        let file = File::create(&dest).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(json.as_bytes()).map_err(io_err)?;
        writer.flush().map_err(io_err)?;
        Ok(dest)
    }
}
