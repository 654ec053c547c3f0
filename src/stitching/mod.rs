//! Stitching of overlapping probability chunks.
//!
//! Both algorithms walk a reference's chunks with the same two-chunk window:
//!
//! 1. [`walker::ChunkWalker`] trims the overlap between consecutive chunks
//!    (using an [`overlap::OverlapResolver`]) and flags where coverage breaks
//! 2. [`stitcher`] decodes the trimmed rows into [`ConsensusRecord`]s
//! 3. [`variants`] classifies major positions of the trimmed rows as SNPs
//!
//! [`gaps`] post-processes consensus records against a draft assembly.
//!
//! ## Example
//!
//! ```rust,no_run
//! use probstitch::parsing::probs::ChunkIndex;
//! use probstitch::stitching::overlap::MidpointResolver;
//! use probstitch::stitching::stitcher::stitch;
//! use std::path::PathBuf;
//!
//! let index = ChunkIndex::open(&[PathBuf::from("probs.bin")]).unwrap();
//! let report = stitch(&index, &["chr1".to_string()], &MidpointResolver);
//! for record in &report.records {
//!     println!(">{}\n{}", record.key(), record.sequence);
//! }
//! ```
//!
//! [`ConsensusRecord`]: crate::core::ConsensusRecord

pub mod gaps;
pub mod overlap;
pub mod stitcher;
pub mod variants;
pub mod walker;

use thiserror::Error;

use crate::core::chunk::{Position, ProbabilityChunk};
use crate::core::labels::LabelCodec;
use crate::output::WriteError;
use crate::utils::validation::ValidationError;

#[derive(Error, Debug)]
pub enum StitchError {
    #[error("Chunk stream is empty")]
    EmptyStream,

    #[error("No chunks found for reference '{0}'")]
    NoDataForReference(String),

    #[error("Chunk '{chunk}' belongs to '{found}', expected '{expected}'")]
    ReferenceMismatch {
        chunk: String,
        expected: String,
        found: String,
    },

    #[error("Chunk '{second}' starts at {second_start}, before chunk '{first}' at {first_start}")]
    ChunkOrder {
        first: String,
        first_start: Position,
        second: String,
        second_start: Position,
    },

    #[error("Overlap between '{first}' and '{second}' is out of bounds: {detail}")]
    InvalidOverlap {
        first: String,
        second: String,
        detail: String,
    },

    #[error("Reference sequence '{0}' not found")]
    ReferenceMissing(String),

    #[error("Reference '{ref_name}' has no base at position {position} (length {length})")]
    ReferenceSymbolMissing {
        ref_name: String,
        position: u64,
        length: usize,
    },

    #[error("Invalid chunk '{chunk}': {source}")]
    InvalidChunk {
        chunk: String,
        #[source]
        source: ValidationError,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to write output: {0}")]
    Write(#[from] WriteError),
}

/// Supplier of per-reference chunk streams.
pub trait ChunkSource {
    /// Label alphabet shared by every chunk of the source
    fn label_codec(&self) -> &LabelCodec;

    /// All reference names with chunks, in first-seen order
    fn ref_names(&self) -> Vec<String>;

    /// Chunks for one reference, ordered by ascending start coordinate.
    ///
    /// Each call starts a fresh pass over the reference.
    fn chunks<'a>(&'a self, ref_name: &str) -> Box<dyn Iterator<Item = &'a ProbabilityChunk> + 'a>;
}

/// Random access to reference bases.
pub trait ReferenceLookup {
    /// Full sequence of `ref_name`, 0-based
    fn fetch(&self, ref_name: &str) -> Option<&[u8]>;
}

/// Per-reference outcome of a multi-reference run.
#[derive(Debug)]
pub struct RunFailure {
    pub ref_name: String,
    pub error: StitchError,
}
