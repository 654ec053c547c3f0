//! Decode trimmed chunks into contiguous consensus records.

use tracing::{error, info};

use crate::core::chunk::{Position, ProbabilityChunk};
use crate::core::labels::LabelCodec;
use crate::core::record::ConsensusRecord;
use crate::stitching::overlap::OverlapResolver;
use crate::stitching::walker::ChunkWalker;
use crate::stitching::{ChunkSource, RunFailure, StitchError};

/// Consensus records for every reference that stitched, plus the failures.
#[derive(Debug, Default)]
pub struct StitchReport {
    /// Records in requested reference order, then coordinate order
    pub records: Vec<ConsensusRecord>,
    pub failures: Vec<RunFailure>,
}

/// Stitch each requested reference independently.
///
/// A reference that fails (no chunks, bad ordering, ...) is reported in
/// [`StitchReport::failures`] and does not stop the others.
pub fn stitch<S, R>(source: &S, ref_names: &[String], resolver: &R) -> StitchReport
where
    S: ChunkSource + ?Sized,
    R: OverlapResolver,
{
    let codec = source.label_codec();
    let mut report = StitchReport::default();

    for ref_name in ref_names {
        info!("Processing {}.", ref_name);
        match stitch_reference(ref_name, source.chunks(ref_name), resolver, codec) {
            Ok(records) => report.records.extend(records),
            Err(e) => {
                error!("Failed to stitch {}: {}", ref_name, e);
                report.failures.push(RunFailure {
                    ref_name: ref_name.clone(),
                    error: e,
                });
            }
        }
    }

    report
}

/// Stitch the ordered chunks of one reference.
///
/// # Errors
///
/// Returns `StitchError::NoDataForReference` if `chunks` is empty,
/// `StitchError::InvalidChunk` if a row's width differs from the alphabet, or
/// any integrity error raised while walking the chunks.
pub fn stitch_reference<'a, C, R>(
    ref_name: &str,
    chunks: C,
    resolver: &R,
    codec: &LabelCodec,
) -> Result<Vec<ConsensusRecord>, StitchError>
where
    C: IntoIterator<Item = &'a ProbabilityChunk>,
    R: OverlapResolver,
{
    let walker = ChunkWalker::new(ref_name, chunks, resolver).map_err(|e| match e {
        StitchError::EmptyStream => StitchError::NoDataForReference(ref_name.to_string()),
        other => other,
    })?;

    let mut records = Vec::new();
    let mut span: Option<SpanBuilder> = None;

    for trimmed in walker {
        let trimmed = trimmed?;
        trimmed.check_row_widths(codec.len())?;

        if let Some(&first) = trimmed.positions().first() {
            let builder = span.get_or_insert_with(|| SpanBuilder::new(first));
            builder
                .sequence
                .push_str(&codec.decode_rows(trimmed.label_probs().iter().map(Vec::as_slice)));
            builder.end = trimmed.positions()[trimmed.positions().len() - 1];
        }

        if trimmed.is_span_end {
            if let Some(builder) = span.take() {
                records.push(builder.finish(ref_name));
            }
        }
    }

    Ok(records)
}

/// Accumulates one span of contiguous coverage
struct SpanBuilder {
    start: Position,
    end: Position,
    sequence: String,
}

impl SpanBuilder {
    fn new(start: Position) -> Self {
        Self {
            start,
            end: start,
            sequence: String::new(),
        }
    }

    fn finish(self, ref_name: &str) -> ConsensusRecord {
        ConsensusRecord {
            ref_name: ref_name.to_string(),
            start: self.start,
            end: self.end,
            sequence: self.sequence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stitching::overlap::{MidpointResolver, Overlap};
    use crate::utils::validation::ValidationError;

    const SYMBOLS: [char; 5] = ['A', 'C', 'G', 'T', '*'];

    fn codec() -> LabelCodec {
        LabelCodec::new(SYMBOLS.to_vec(), '*').unwrap()
    }

    fn one_hot(symbol: char) -> Vec<f32> {
        SYMBOLS.iter().map(|&s| if s == symbol { 1.0 } else { 0.0 }).collect()
    }

    /// Chunk over consecutive majors starting at `start`, one base per major
    fn chunk(name: &str, start: u64, bases: &str) -> ProbabilityChunk {
        ProbabilityChunk::new(
            name,
            "chr1",
            (0..bases.len() as u64).map(|i| Position::new(start + i, 0)).collect(),
            bases.chars().map(one_hot).collect(),
        )
    }

    #[test]
    fn test_single_chunk_decodes_and_strips_gaps() {
        let chunks = vec![chunk("c0", 0, "AC*GT*")];
        let records = stitch_reference("chr1", &chunks, &MidpointResolver, &codec()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sequence, "ACGT");
        assert_eq!(records[0].key(), "chr1:1.0-6.0");
    }

    #[test]
    fn test_overlapping_chunks_join_without_duplication() {
        let truth = "ACGTTGCAACGGTA";
        let chunks = vec![
            chunk("c0", 0, &truth[0..8]),
            chunk("c1", 4, &truth[4..12]),
            chunk("c2", 9, &truth[9..14]),
        ];
        let records = stitch_reference("chr1", &chunks, &MidpointResolver, &codec()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sequence, truth);
        assert_eq!(records[0].start, Position::new(0, 0));
        assert_eq!(records[0].end, Position::new(13, 0));
    }

    #[test]
    fn test_gap_splits_records() {
        let chunks = vec![chunk("c0", 0, "ACGT"), chunk("c1", 10, "TTGA")];
        let records = stitch_reference("chr1", &chunks, &MidpointResolver, &codec()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].key(), "chr1:1.0-4.0");
        assert_eq!(records[0].sequence, "ACGT");
        assert_eq!(records[1].key(), "chr1:11.0-14.0");
        assert_eq!(records[1].sequence, "TTGA");
    }

    #[test]
    fn test_resolver_gap_with_trim_point() {
        let chunks = vec![chunk("c0", 0, "ACGTAC"), chunk("c1", 3, "TACGG")];
        let resolver = |_: &ProbabilityChunk, _: &ProbabilityChunk| {
            Ok::<_, StitchError>(Overlap {
                end_in_first: Some(4),
                start_in_second: None,
            })
        };
        let records = stitch_reference("chr1", &chunks, &resolver, &codec()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].sequence, "ACGT");
        assert_eq!(records[0].end, Position::new(3, 0));
        assert_eq!(records[1].sequence, "TACGG");
        assert_eq!(records[1].start, Position::new(3, 0));
    }

    #[test]
    fn test_contained_chunk_has_no_effect() {
        let with = vec![chunk("c0", 0, "ACGTACGT"), chunk("c1", 2, "GG"), chunk("c2", 6, "GTCC")];
        let without = vec![with[0].clone(), with[2].clone()];
        let a = stitch_reference("chr1", &with, &MidpointResolver, &codec()).unwrap();
        let b = stitch_reference("chr1", &without, &MidpointResolver, &codec()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].sequence, "ACGTACGTCC");
    }

    #[test]
    fn test_empty_reference_fails() {
        let chunks: Vec<ProbabilityChunk> = Vec::new();
        let result = stitch_reference("chrZ", &chunks, &MidpointResolver, &codec());
        assert!(matches!(result, Err(StitchError::NoDataForReference(name)) if name == "chrZ"));
    }

    #[test]
    fn test_narrow_row_is_an_error() {
        let mut narrow = chunk("c0", 0, "ACGT");
        narrow.label_probs[2] = vec![0.2, 0.8];
        let result = stitch_reference("chr1", &[narrow], &MidpointResolver, &codec());
        assert!(matches!(
            result,
            Err(StitchError::InvalidChunk {
                source: ValidationError::RowWidth { row: 2, expected: 5, found: 2 },
                ..
            })
        ));
    }
}
