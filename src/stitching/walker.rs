//! Two-chunk sliding window over one reference's chunk stream.
//!
//! The walker holds the current chunk `s1` and pulls the next chunk `s2`:
//!
//! | Next chunk | Action |
//! |------------|--------|
//! | end of stream | emit the rest of `s1`, ending the span |
//! | ends at or before `s1` | skip it, keep `s1` |
//! | overlaps `s1` | emit `s1` up to the trim point, resume `s2` after it |
//! | no overlap | emit the rest of `s1` (up to any trim point), ending the span |
//!
//! Every chunk is emitted exactly once, as a [`TrimmedChunk`], before the walker
//! moves on to the next one.

use std::ops::Range;

use tracing::{info, warn};

use crate::core::chunk::{Position, ProbabilityChunk};
use crate::stitching::overlap::OverlapResolver;
use crate::stitching::StitchError;
use crate::utils::validation::ValidationError;

/// The rows of one chunk that survive trimming.
#[derive(Debug, Clone)]
pub struct TrimmedChunk<'a> {
    pub chunk: &'a ProbabilityChunk,

    /// Rows owned by this chunk, end exclusive
    pub rows: Range<usize>,

    /// Coverage breaks after these rows: no overlap with the next chunk, or
    /// the end of the stream
    pub is_span_end: bool,
}

impl<'a> TrimmedChunk<'a> {
    #[must_use]
    pub fn positions(&self) -> &'a [Position] {
        &self.chunk.positions[self.rows.clone()]
    }

    #[must_use]
    pub fn label_probs(&self) -> &'a [Vec<f32>] {
        &self.chunk.label_probs[self.rows.clone()]
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Check that every owned row holds one probability per label.
    ///
    /// # Errors
    ///
    /// Returns `StitchError::InvalidChunk` for the first row of another width.
    pub fn check_row_widths(&self, n_labels: usize) -> Result<(), StitchError> {
        let rows = self.label_probs();
        match rows.iter().position(|row| row.len() != n_labels) {
            Some(i) => Err(StitchError::InvalidChunk {
                chunk: self.chunk.name.clone(),
                source: ValidationError::RowWidth {
                    row: self.rows.start + i,
                    expected: n_labels,
                    found: rows[i].len(),
                },
            }),
            None => Ok(()),
        }
    }
}

/// Iterator of trimmed chunks for a single reference.
pub struct ChunkWalker<'a, 'r, I, R> {
    ref_name: String,
    chunks: I,
    resolver: &'r R,
    current: Option<&'a ProbabilityChunk>,
    resume: usize,
}

impl<'a, 'r, I, R> ChunkWalker<'a, 'r, I, R>
where
    I: Iterator<Item = &'a ProbabilityChunk>,
    R: OverlapResolver,
{
    /// Start walking `chunks`, which must all belong to `ref_name`.
    ///
    /// # Errors
    ///
    /// Returns `StitchError::EmptyStream` if there are no chunks, or
    /// `StitchError::ReferenceMismatch` if the first chunk belongs elsewhere.
    pub fn new<C>(ref_name: &str, chunks: C, resolver: &'r R) -> Result<Self, StitchError>
    where
        C: IntoIterator<IntoIter = I>,
    {
        let mut chunks = chunks.into_iter();
        let first = chunks.next().ok_or(StitchError::EmptyStream)?;
        check_reference(ref_name, first)?;

        Ok(Self {
            ref_name: ref_name.to_string(),
            chunks,
            resolver,
            current: Some(first),
            resume: 0,
        })
    }

    /// Compare the current chunk with the next one. `Ok(None)` means `second`
    /// was skipped.
    fn step(
        &mut self,
        first: &'a ProbabilityChunk,
        second: &'a ProbabilityChunk,
    ) -> Result<Option<TrimmedChunk<'a>>, StitchError> {
        check_reference(&self.ref_name, second)?;

        if second.first_pos() < first.first_pos() {
            return Err(StitchError::ChunkOrder {
                first: first.name.clone(),
                first_start: first.first_pos(),
                second: second.name.clone(),
                second_start: second.first_pos(),
            });
        }

        if second.last_pos() <= first.last_pos() {
            info!("{} ends before {}, skipping.", second.name, first.name);
            return Ok(None);
        }

        let overlap = self.resolver.resolve(first, second)?;

        let end = overlap.end_in_first.unwrap_or(first.len());
        if end > first.len() {
            return Err(invalid_overlap(
                first,
                second,
                format!("end {end} exceeds {} rows", first.len()),
            ));
        }
        if let Some(start) = overlap.start_in_second {
            if start > second.len() {
                return Err(invalid_overlap(
                    first,
                    second,
                    format!("start {start} exceeds {} rows", second.len()),
                ));
            }
        }

        let is_span_end = overlap.start_in_second.is_none();
        if is_span_end {
            if second.first_pos() <= first.last_pos() {
                warn!(
                    "No usable overlap between {} and {} although their coordinates overlap, starting a new span.",
                    first.name, second.name
                );
            } else {
                info!("There is no overlap between {} and {}.", first.name, second.name);
            }
        }

        let trimmed = TrimmedChunk {
            chunk: first,
            rows: self.resume.min(end)..end,
            is_span_end,
        };

        self.current = Some(second);
        self.resume = overlap.start_in_second.unwrap_or(0);

        Ok(Some(trimmed))
    }
}

impl<'a, 'r, I, R> Iterator for ChunkWalker<'a, 'r, I, R>
where
    I: Iterator<Item = &'a ProbabilityChunk>,
    R: OverlapResolver,
{
    type Item = Result<TrimmedChunk<'a>, StitchError>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.current.take()?;

        loop {
            let Some(second) = self.chunks.next() else {
                // Terminal: flush whatever remains of the last chunk
                return Some(Ok(TrimmedChunk {
                    chunk: first,
                    rows: self.resume.min(first.len())..first.len(),
                    is_span_end: true,
                }));
            };

            match self.step(first, second) {
                Ok(Some(trimmed)) => return Some(Ok(trimmed)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

fn check_reference(ref_name: &str, chunk: &ProbabilityChunk) -> Result<(), StitchError> {
    if chunk.ref_name == ref_name {
        Ok(())
    } else {
        Err(StitchError::ReferenceMismatch {
            chunk: chunk.name.clone(),
            expected: ref_name.to_string(),
            found: chunk.ref_name.clone(),
        })
    }
}

fn invalid_overlap(
    first: &ProbabilityChunk,
    second: &ProbabilityChunk,
    detail: String,
) -> StitchError {
    StitchError::InvalidOverlap {
        first: first.name.clone(),
        second: second.name.clone(),
        detail,
    }
}
