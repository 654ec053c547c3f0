//! Reference and draft sequences loaded from FASTA using noodles.
//!
//! Supports both uncompressed and gzip/bgzip compressed files.
//!
//! Supported extensions:
//! - `.fa`, `.fasta`, `.fna` (uncompressed)
//! - `.fa.gz`, `.fasta.gz`, `.fna.gz` (gzip compressed)
//! - `.fa.bgz`, `.fasta.bgz`, `.fna.bgz` (bgzip compressed)

use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use noodles::fasta;
use tracing::debug;

use crate::parsing::ParseError;
use crate::stitching::ReferenceLookup;

#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}

/// Named sequences held in memory, in file order.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSequences {
    names: Vec<String>,
    sequences: HashMap<String, Vec<u8>>,
}

impl ReferenceSequences {
    /// Build from `(name, sequence)` pairs. A repeated name keeps its first sequence.
    #[must_use]
    pub fn from_sequences(records: Vec<(String, Vec<u8>)>) -> Self {
        let mut refs = Self::default();
        for (name, sequence) in records {
            if refs.sequences.contains_key(&name) {
                continue;
            }
            refs.names.push(name.clone());
            refs.sequences.insert(name, sequence);
        }
        refs
    }

    /// Load every record of a FASTA file.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Io` if the file cannot be read, `ParseError::Noodles`
    /// if parsing fails, or `ParseError::InvalidFormat` if the file has no
    /// records or repeats a name.
    pub fn from_path(path: &Path) -> Result<Self, ParseError> {
        let file = std::fs::File::open(path)?;
        let refs = if is_gzipped(path) {
            let mut reader = fasta::io::Reader::new(BufReader::new(GzDecoder::new(file)));
            Self::from_reader(&mut reader)?
        } else {
            let mut reader = fasta::io::Reader::new(BufReader::new(file));
            Self::from_reader(&mut reader)?
        };
        debug!("Loaded {} sequences from {}.", refs.len(), path.display());
        Ok(refs)
    }

    fn from_reader<R: BufRead>(reader: &mut fasta::io::Reader<R>) -> Result<Self, ParseError> {
        let mut refs = Self::default();

        for result in reader.records() {
            let record = result
                .map_err(|e| ParseError::Noodles(format!("Failed to parse FASTA record: {e}")))?;

            let name = String::from_utf8_lossy(record.name()).to_string();
            if refs.sequences.contains_key(&name) {
                return Err(ParseError::InvalidFormat(format!(
                    "Duplicate FASTA record name '{name}'"
                )));
            }
            let sequence = record.sequence().as_ref().to_vec();
            refs.names.push(name.clone());
            refs.sequences.insert(name, sequence);
        }

        if refs.is_empty() {
            return Err(ParseError::InvalidFormat(
                "No sequences found in FASTA file".to_string(),
            ));
        }

        Ok(refs)
    }

    /// Sequence names in file order
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn length(&self, name: &str) -> Option<u64> {
        self.sequences.get(name).map(|s| s.len() as u64)
    }

    /// `(name, length)` for every sequence, in file order
    #[must_use]
    pub fn lengths(&self) -> Vec<(String, u64)> {
        self.names
            .iter()
            .filter_map(|name| Some((name.clone(), self.length(name)?)))
            .collect()
    }
}

impl ReferenceLookup for ReferenceSequences {
    fn fetch(&self, ref_name: &str) -> Option<&[u8]> {
        self.sequences.get(ref_name).map(Vec::as_slice)
    }
}
