//! Trim points between consecutive chunks.

use tracing::debug;

use crate::core::chunk::ProbabilityChunk;
use crate::stitching::StitchError;

/// Where to cut two overlapping chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Overlap {
    /// Exclusive end row in the first chunk; `None` keeps every remaining row
    pub end_in_first: Option<usize>,

    /// Row of the second chunk to resume from; `None` means no overlap
    pub start_in_second: Option<usize>,
}

impl Overlap {
    /// The chunks do not overlap
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn at(end_in_first: usize, start_in_second: usize) -> Self {
        Self {
            end_in_first: Some(end_in_first),
            start_in_second: Some(start_in_second),
        }
    }
}

/// Chooses the boundary between two chunks of the same reference.
pub trait OverlapResolver {
    /// # Errors
    ///
    /// Implementations may fail when the pair cannot be compared at all.
    fn resolve(
        &self,
        first: &ProbabilityChunk,
        second: &ProbabilityChunk,
    ) -> Result<Overlap, StitchError>;
}

impl<F> OverlapResolver for F
where
    F: Fn(&ProbabilityChunk, &ProbabilityChunk) -> Result<Overlap, StitchError>,
{
    fn resolve(
        &self,
        first: &ProbabilityChunk,
        second: &ProbabilityChunk,
    ) -> Result<Overlap, StitchError> {
        self(first, second)
    }
}

/// Splits the shared coordinates of two chunks in half.
///
/// Chunk edges carry the least context, so the cut sits in the middle of the
/// overlap: the first half comes from `first`, the second half from `second`.
/// When the coordinates in the overlap disagree the pair is reported as not
/// overlapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct MidpointResolver;

impl OverlapResolver for MidpointResolver {
    fn resolve(
        &self,
        first: &ProbabilityChunk,
        second: &ProbabilityChunk,
    ) -> Result<Overlap, StitchError> {
        if first.is_empty() || second.is_empty() {
            return Ok(Overlap::none());
        }

        // Rows of `first` at or after the start of `second`
        let second_start = second.first_pos();
        let ovl_start_first = first.positions.partition_point(|p| *p < second_start);
        if ovl_start_first == first.len() {
            return Ok(Overlap::none());
        }

        // Rows of `second` at or before the end of `first`
        let first_end = first.last_pos();
        let ovl_end_second = second.positions.partition_point(|p| *p <= first_end);

        let first_ovl = &first.positions[ovl_start_first..];
        let second_ovl = &second.positions[..ovl_end_second];
        if first_ovl != second_ovl {
            debug!(
                "Coordinates of {} and {} disagree in their overlap ({} vs {} rows).",
                first.name,
                second.name,
                first_ovl.len(),
                second_ovl.len()
            );
            return Ok(Overlap::none());
        }

        let half = first_ovl.len() / 2;
        Ok(Overlap::at(ovl_start_first + half, half))
    }
}
