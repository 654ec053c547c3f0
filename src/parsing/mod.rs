//! Readers for the inputs of a stitching run.
//!
//! This module provides:
//!
//! - **Chunk stores** ([`probs`]): serde containers of probability chunks plus
//!   their label alphabet, and an index that serves per-reference chunk streams
//! - **FASTA references** ([`fasta`]): reference/draft sequences loaded with noodles
//!
//! ## Chunk store encodings
//!
//! | Extension | Encoding |
//! |-----------|----------|
//! | `.json` | JSON |
//! | `.json.gz` | gzipped JSON |
//! | anything else | bincode |
//! | `*.gz` | gzipped bincode |

pub mod fasta;
pub mod probs;

use thiserror::Error;

use crate::core::labels::LabelError;
use crate::utils::validation::ValidationError;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON chunk store: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid binary chunk store: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("noodles error: {0}")]
    Noodles(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Invalid label alphabet: {0}")]
    Labels(#[from] LabelError),

    #[error("Invalid chunk '{chunk}': {source}")]
    InvalidChunk {
        chunk: String,
        #[source]
        source: ValidationError,
    },

    #[error("Label alphabets differ between chunk stores: '{expected}' vs '{found}'")]
    LabelMismatch { expected: String, found: String },
}
