use serde::{Deserialize, Serialize};

/// A reference-anchored coordinate.
///
/// `major` is the 0-based index of a base in the reference. `minor == 0` is the
/// call aligned to that base; `minor > 0` is an inserted base following it.
/// Positions order lexicographically, major first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub major: u64,
    pub minor: u32,
}

impl Position {
    #[must_use]
    pub fn new(major: u64, minor: u32) -> Self {
        Self { major, minor }
    }

    /// True for reference-aligned (non-insertion) positions
    #[must_use]
    pub fn is_major(&self) -> bool {
        self.minor == 0
    }
}

/// Renders as `major.minor` with a 1-based major coordinate.
impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major + 1, self.minor)
    }
}

/// A window of per-position label probabilities covering part of one reference.
///
/// Rows of `label_probs` are index-aligned with `positions`. Chunks are produced
/// upstream and only ever read here; use
/// [`validate_chunk`](crate::utils::validation::validate_chunk) before walking
/// chunks from an untrusted source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityChunk {
    /// Identifier used in diagnostics only
    pub name: String,

    /// Reference sequence this chunk covers
    pub ref_name: String,

    /// One coordinate per row, non-decreasing
    pub positions: Vec<Position>,

    /// One probability distribution over the label alphabet per row
    pub label_probs: Vec<Vec<f32>>,
}

impl ProbabilityChunk {
    pub fn new(
        name: impl Into<String>,
        ref_name: impl Into<String>,
        positions: Vec<Position>,
        label_probs: Vec<Vec<f32>>,
    ) -> Self {
        Self {
            name: name.into(),
            ref_name: ref_name.into(),
            positions,
            label_probs,
        }
    }

    /// Number of rows
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Coordinate of the first row.
    ///
    /// # Panics
    ///
    /// Panics on an empty chunk; validated chunks are never empty.
    #[must_use]
    pub fn first_pos(&self) -> Position {
        self.positions[0]
    }

    /// Coordinate of the last row, used for coarse ordering between chunks.
    ///
    /// # Panics
    ///
    /// Panics on an empty chunk; validated chunks are never empty.
    #[must_use]
    pub fn last_pos(&self) -> Position {
        self.positions[self.positions.len() - 1]
    }
}
