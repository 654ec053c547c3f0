//! Centralized validation of chunk data and numeric parameters.

use crate::core::chunk::{Position, ProbabilityChunk};

/// Data-integrity error types
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Chunk has no rows")]
    EmptyChunk,
    #[error("Chunk has {positions} positions but {rows} probability rows")]
    RowCountMismatch { positions: usize, rows: usize },
    #[error("Positions are not sorted: {previous} is followed by {next}")]
    UnsortedPositions { previous: Position, next: Position },
    #[error("Row {row} has {found} probabilities, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Row {row} holds an invalid probability {value}")]
    InvalidProbability { row: usize, value: f32 },
    #[error("Threshold {0} must lie in [0, 1]")]
    ThresholdOutOfRange(f64),
}

/// Check that a chunk can be walked safely.
///
/// A chunk must have at least one row, one position per row, sorted positions,
/// `n_labels` entries per row, and only finite non-negative entries.
///
/// # Errors
///
/// Returns the first `ValidationError` found.
pub fn validate_chunk(chunk: &ProbabilityChunk, n_labels: usize) -> Result<(), ValidationError> {
    if chunk.is_empty() {
        return Err(ValidationError::EmptyChunk);
    }

    if chunk.positions.len() != chunk.label_probs.len() {
        return Err(ValidationError::RowCountMismatch {
            positions: chunk.positions.len(),
            rows: chunk.label_probs.len(),
        });
    }

    if let Some(pair) = chunk.positions.windows(2).find(|w| w[1] < w[0]) {
        return Err(ValidationError::UnsortedPositions {
            previous: pair[0],
            next: pair[1],
        });
    }

    for (row, probs) in chunk.label_probs.iter().enumerate() {
        if probs.len() != n_labels {
            return Err(ValidationError::RowWidth {
                row,
                expected: n_labels,
                found: probs.len(),
            });
        }
        if let Some(&value) = probs.iter().find(|p| !p.is_finite() || **p < 0.0) {
            return Err(ValidationError::InvalidProbability { row, value });
        }
    }

    Ok(())
}

/// Check that a probability threshold lies in `[0, 1]`.
///
/// # Errors
///
/// Returns `ValidationError::ThresholdOutOfRange` otherwise (including NaN).
pub fn validate_threshold(threshold: f64) -> Result<f64, ValidationError> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(ValidationError::ThresholdOutOfRange(threshold))
    }
}
