use serde::{Deserialize, Serialize};

use crate::core::chunk::Position;

/// A contiguous stretch of stitched consensus for one reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusRecord {
    pub ref_name: String,

    /// First coordinate covered (inclusive)
    pub start: Position,

    /// Last coordinate covered (inclusive)
    pub end: Position,

    /// Decoded sequence with gap symbols removed
    pub sequence: String,
}

impl ConsensusRecord {
    /// Record key, `ref_name:start-end` with `major.minor` coordinates
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}:{}-{}", self.ref_name, self.start, self.end)
    }
}

/// Unphased diploid genotype of a SNP call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Genotype {
    /// Both copies carry the single alternate
    HomozygousAlt,
    /// One reference copy, one alternate
    HeterozygousRefAlt,
    /// Two different alternates, no reference copy
    HeterozygousAltAlt,
}

impl std::fmt::Display for Genotype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HomozygousAlt => write!(f, "1/1"),
            Self::HeterozygousRefAlt => write!(f, "0/1"),
            Self::HeterozygousAltAlt => write!(f, "1/2"),
        }
    }
}

/// Supporting probabilities recorded with each call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantInfo {
    pub ref_prob: f64,
    pub primary_prob: f64,
    pub secondary_prob: f64,
    pub secondary_label: char,
}

/// A single-nucleotide variant call at a major position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantCandidate {
    pub ref_name: String,

    /// 0-based major coordinate
    pub position: u64,

    pub ref_base: char,

    /// One or two alternate bases, primary call first
    pub alts: Vec<char>,

    pub genotype: Genotype,

    /// Phred-scaled genotype quality, also reported as the site quality
    pub quality: f64,

    pub filter: String,

    pub info: VariantInfo,
}
