//! Threshold-based SNP calling from trimmed probability chunks.
//!
//! At each major position the two most probable labels are compared with the
//! reference base:
//!
//! | Secondary prob | Condition | Call | Quality |
//! |----------------|-----------|------|---------|
//! | `< threshold` | primary not ref, not gap | `1/1` | `-10·log10(1 - p1)` |
//! | `>= threshold` | neither top label is gap | `0/1` or `1/2` | `-10·log10(1 - p1 - p2)` |
//!
//! The two rows of the table are exclusive because their secondary-probability
//! conditions are complementary. A secondary gap above threshold is never
//! called: it may be a SNP on one haplotype and a deletion on the other.

use tracing::{debug, error, info, warn};

use crate::core::chunk::ProbabilityChunk;
use crate::core::labels::LabelCodec;
use crate::core::record::{Genotype, VariantCandidate, VariantInfo};
use crate::output::WriteError;
use crate::stitching::overlap::OverlapResolver;
use crate::stitching::walker::{ChunkWalker, TrimmedChunk};
use crate::stitching::{ChunkSource, ReferenceLookup, RunFailure, StitchError};
use crate::utils::validation::validate_threshold;

/// Probability below which a secondary call is deemed insignificant
pub const DEFAULT_THRESHOLD: f64 = 0.1;

/// Floor for the error probability fed to the quality logarithm.
///
/// Top-call probabilities summing to 1 (or above, through float accumulation)
/// would otherwise give an infinite or undefined quality. Caps quality at 100.
pub const MIN_ERROR_PROBABILITY: f64 = 1e-10;

/// Receives variant calls in position order, one reference at a time.
pub trait VariantSink {
    /// # Errors
    ///
    /// Returns `WriteError` if the variant cannot be recorded.
    fn write_variant(&mut self, variant: &VariantCandidate) -> Result<(), WriteError>;
}

impl VariantSink for Vec<VariantCandidate> {
    fn write_variant(&mut self, variant: &VariantCandidate) -> Result<(), WriteError> {
        self.push(variant.clone());
        Ok(())
    }
}

/// Phred-scaled quality of an error probability, clamped at
/// [`MIN_ERROR_PROBABILITY`]
#[must_use]
pub fn phred_quality(error_prob: f64) -> f64 {
    -10.0 * error_prob.max(MIN_ERROR_PROBABILITY).log10()
}

/// The two most probable labels of a row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopTwo {
    pub primary: usize,
    pub primary_prob: f64,
    pub secondary: usize,
    pub secondary_prob: f64,
}

impl TopTwo {
    /// Rank a row as a stable ascending sort would: among equal
    /// probabilities the higher label index ranks higher.
    ///
    /// # Panics
    ///
    /// Panics if `row` has fewer than two entries.
    #[must_use]
    pub fn from_row(row: &[f32]) -> Self {
        assert!(row.len() >= 2, "need at least two labels to rank");

        let (mut primary, mut secondary) = (0, 1);
        if row[1] >= row[0] {
            (primary, secondary) = (1, 0);
        }
        for (index, &prob) in row.iter().enumerate().skip(2) {
            if prob >= row[primary] {
                secondary = primary;
                primary = index;
            } else if prob >= row[secondary] {
                secondary = index;
            }
        }

        Self {
            primary,
            primary_prob: f64::from(row[primary]),
            secondary,
            secondary_prob: f64::from(row[secondary]),
        }
    }
}

/// A classified SNP before it is attached to a reference position.
#[derive(Debug, Clone, PartialEq)]
pub struct SnpCall {
    pub genotype: Genotype,
    /// Alternate label indices, primary call first
    pub alts: Vec<usize>,
    pub quality: f64,
    pub top: TopTwo,
}

/// Calls made on one trimmed chunk.
#[derive(Debug, Default)]
pub struct BlockCalls {
    /// Variants sorted by position
    pub variants: Vec<VariantCandidate>,

    /// Major positions skipped because their reference base is not a label
    pub unlabelled: usize,
}

/// Classifies rows against reference bases.
#[derive(Debug, Clone, Copy)]
pub struct SnpCaller<'c> {
    codec: &'c LabelCodec,
    threshold: f64,
}

impl<'c> SnpCaller<'c> {
    /// # Errors
    ///
    /// Returns `StitchError::Validation` unless `0 <= threshold <= 1`.
    pub fn new(codec: &'c LabelCodec, threshold: f64) -> Result<Self, StitchError> {
        let threshold = validate_threshold(threshold)?;
        Ok(Self { codec, threshold })
    }

    /// Primary call differs from the reference and is not a gap, and the
    /// secondary call is insignificant
    #[must_use]
    pub fn is_homozygous(&self, top: &TopTwo, ref_index: usize) -> bool {
        top.primary != ref_index
            && top.primary != self.codec.gap_index()
            && top.secondary_prob < self.threshold
    }

    /// Secondary call is significant and neither top call is a gap
    #[must_use]
    pub fn is_heterozygous(&self, top: &TopTwo) -> bool {
        top.secondary_prob >= self.threshold
            && top.secondary != self.codec.gap_index()
            && top.primary != self.codec.gap_index()
    }

    /// Classify one probability row against the encoded reference base.
    #[must_use]
    pub fn classify(&self, row: &[f32], ref_index: usize) -> Option<SnpCall> {
        let top = TopTwo::from_row(row);

        if self.is_homozygous(&top, ref_index) {
            return Some(SnpCall {
                genotype: Genotype::HomozygousAlt,
                alts: vec![top.primary],
                quality: phred_quality(1.0 - top.primary_prob),
                top,
            });
        }

        if self.is_heterozygous(&top) {
            let alts: Vec<usize> = [top.primary, top.secondary]
                .into_iter()
                .filter(|&label| label != ref_index)
                .collect();
            let genotype = if alts.len() == 1 {
                Genotype::HeterozygousRefAlt
            } else {
                Genotype::HeterozygousAltAlt
            };
            return Some(SnpCall {
                genotype,
                alts,
                quality: phred_quality(1.0 - top.primary_prob - top.secondary_prob),
                top,
            });
        }

        None
    }

    /// Call the major positions of one trimmed chunk, sorted by position.
    ///
    /// # Errors
    ///
    /// Returns `StitchError::InvalidChunk` if a row's width differs from the
    /// alphabet, or `StitchError::ReferenceSymbolMissing` if a major position
    /// lies beyond the end of `reference`.
    pub fn call_block(
        &self,
        trimmed: &TrimmedChunk<'_>,
        reference: &[u8],
    ) -> Result<BlockCalls, StitchError> {
        trimmed.check_row_widths(self.codec.len())?;

        let ref_name = &trimmed.chunk.ref_name;
        let mut block = BlockCalls::default();

        for (pos, row) in trimmed.positions().iter().zip(trimmed.label_probs()) {
            if !pos.is_major() {
                continue;
            }

            let base = usize::try_from(pos.major)
                .ok()
                .and_then(|i| reference.get(i))
                .ok_or_else(|| StitchError::ReferenceSymbolMissing {
                    ref_name: ref_name.clone(),
                    position: pos.major,
                    length: reference.len(),
                })?;
            let ref_base = char::from(*base).to_ascii_uppercase();

            let Some(ref_index) = self.codec.encode(ref_base) else {
                debug!(
                    "Reference base '{}' at {}:{} is not a label, skipping.",
                    ref_base,
                    ref_name,
                    pos.major + 1
                );
                block.unlabelled += 1;
                continue;
            };

            if let Some(call) = self.classify(row, ref_index) {
                block
                    .variants
                    .push(self.to_candidate(ref_name, pos.major, ref_index, row, call));
            }
        }

        block.variants.sort_by_key(|v| v.position);
        Ok(block)
    }

    fn to_candidate(
        &self,
        ref_name: &str,
        position: u64,
        ref_index: usize,
        row: &[f32],
        call: SnpCall,
    ) -> VariantCandidate {
        let symbol = |index: usize| self.codec.symbols()[index];
        VariantCandidate {
            ref_name: ref_name.to_string(),
            position,
            ref_base: symbol(ref_index),
            alts: call.alts.iter().map(|&a| symbol(a)).collect(),
            genotype: call.genotype,
            quality: call.quality,
            filter: "PASS".to_string(),
            info: VariantInfo {
                ref_prob: f64::from(row[ref_index]),
                primary_prob: call.top.primary_prob,
                secondary_prob: call.top.secondary_prob,
                secondary_label: symbol(call.top.secondary),
            },
        }
    }

    /// Walk one reference and hand its calls to `sink` in position order.
    ///
    /// Nothing reaches `sink` unless the whole reference is called. Returns
    /// the number of variants written.
    ///
    /// # Errors
    ///
    /// Returns `StitchError::NoDataForReference` if `chunks` is empty, or any
    /// walking, reference or sink error.
    pub fn call_reference<'a, C, R, W>(
        &self,
        ref_name: &str,
        chunks: C,
        reference: &[u8],
        resolver: &R,
        sink: &mut W,
    ) -> Result<usize, StitchError>
    where
        C: IntoIterator<Item = &'a ProbabilityChunk>,
        R: OverlapResolver,
        W: VariantSink + ?Sized,
    {
        let walker = ChunkWalker::new(ref_name, chunks, resolver).map_err(|e| match e {
            StitchError::EmptyStream => StitchError::NoDataForReference(ref_name.to_string()),
            other => other,
        })?;

        let mut variants = Vec::new();
        let mut unlabelled = 0;
        for trimmed in walker {
            let block = self.call_block(&trimmed?, reference)?;
            variants.extend(block.variants);
            unlabelled += block.unlabelled;
        }

        if unlabelled > 0 {
            warn!(
                "Skipped {} positions of {} whose reference base is not a label.",
                unlabelled, ref_name
            );
        }

        for variant in &variants {
            sink.write_variant(variant)?;
        }
        Ok(variants.len())
    }
}

/// Outcome of calling variants over several references.
#[derive(Debug, Default)]
pub struct VariantReport {
    pub variants_written: usize,
    pub failures: Vec<RunFailure>,
}

/// Call SNPs on each requested reference independently.
///
/// # Errors
///
/// Returns `StitchError::Validation` for a threshold outside `[0, 1]`.
/// Failures of individual references are collected in the report instead.
pub fn call_variants<S, L, R, W>(
    source: &S,
    lookup: &L,
    ref_names: &[String],
    resolver: &R,
    threshold: f64,
    sink: &mut W,
) -> Result<VariantReport, StitchError>
where
    S: ChunkSource + ?Sized,
    L: ReferenceLookup + ?Sized,
    R: OverlapResolver,
    W: VariantSink + ?Sized,
{
    let caller = SnpCaller::new(source.label_codec(), threshold)?;
    let mut report = VariantReport::default();

    for ref_name in ref_names {
        info!("Processing {}.", ref_name);
        let result = lookup
            .fetch(ref_name)
            .ok_or_else(|| StitchError::ReferenceMissing(ref_name.clone()))
            .and_then(|reference| {
                caller.call_reference(ref_name, source.chunks(ref_name), reference, resolver, sink)
            });

        match result {
            Ok(count) => {
                debug!("Called {} variants on {}.", count, ref_name);
                report.variants_written += count;
            }
            Err(e) => {
                error!("Failed to call variants on {}: {}", ref_name, e);
                report.failures.push(RunFailure {
                    ref_name: ref_name.clone(),
                    error: e,
                });
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chunk::Position;
    use crate::parsing::fasta::ReferenceSequences;
    use crate::parsing::probs::{ChunkIndex, ChunkStore};
    use crate::stitching::overlap::MidpointResolver;
    use crate::utils::validation::ValidationError;

    fn codec() -> LabelCodec {
        LabelCodec::new(vec!['A', 'C', 'G', 'T', '-'], '-').unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn test_top_two_ranking() {
        let top = TopTwo::from_row(&[0.05, 0.5, 0.4, 0.03, 0.02]);
        assert_eq!((top.primary, top.secondary), (1, 2));

        // Ties rank the higher index first, as a stable ascending sort does
        let top = TopTwo::from_row(&[0.5, 0.5, 0.0]);
        assert_eq!((top.primary, top.secondary), (1, 0));
        let top = TopTwo::from_row(&[0.3, 0.4, 0.3]);
        assert_eq!((top.primary, top.secondary), (1, 2));
    }

    #[test]
    fn test_reference_call_is_not_a_variant() {
        let codec = codec();
        let caller = SnpCaller::new(&codec, 0.1).unwrap();
        assert!(caller.classify(&[0.9, 0.05, 0.03, 0.02, 0.0], 0).is_none());
    }

    #[test]
    fn test_homozygous_call() {
        let codec = codec();
        let caller = SnpCaller::new(&codec, 0.1).unwrap();
        let call = caller.classify(&[0.05, 0.9, 0.03, 0.02, 0.0], 0).unwrap();
        assert_eq!(call.genotype, Genotype::HomozygousAlt);
        assert_eq!(call.alts, vec![1]);
        assert!(approx(call.quality, 10.0), "quality {}", call.quality);
    }

    #[test]
    fn test_heterozygous_two_alts() {
        let codec = codec();
        let caller = SnpCaller::new(&codec, 0.1).unwrap();
        let call = caller.classify(&[0.05, 0.5, 0.4, 0.03, 0.02], 0).unwrap();
        assert_eq!(call.genotype, Genotype::HeterozygousAltAlt);
        assert_eq!(call.alts, vec![1, 2]);
        assert!(approx(call.quality, 10.0), "quality {}", call.quality);
    }

    #[test]
    fn test_heterozygous_with_reference() {
        let codec = codec();
        let caller = SnpCaller::new(&codec, 0.1).unwrap();
        // Reference is the primary call
        let call = caller.classify(&[0.6, 0.0, 0.35, 0.05, 0.0], 0).unwrap();
        assert_eq!(call.genotype, Genotype::HeterozygousRefAlt);
        assert_eq!(call.alts, vec![2]);
        // Reference is the secondary call
        let call = caller.classify(&[0.35, 0.0, 0.6, 0.05, 0.0], 0).unwrap();
        assert_eq!(call.genotype, Genotype::HeterozygousRefAlt);
        assert_eq!(call.alts, vec![2]);
    }

    #[test]
    fn test_gaps_are_never_called() {
        let codec = codec();
        let caller = SnpCaller::new(&codec, 0.1).unwrap();
        // Primary gap
        assert!(caller.classify(&[0.0, 0.05, 0.0, 0.0, 0.95], 0).is_none());
        // Significant secondary gap
        assert!(caller.classify(&[0.0, 0.7, 0.0, 0.0, 0.3], 0).is_none());
    }

    #[test]
    fn test_quality_is_clamped() {
        let codec = codec();
        let caller = SnpCaller::new(&codec, 0.1).unwrap();
        let call = caller.classify(&[0.0, 0.6, 0.4, 0.0, 0.0], 0).unwrap();
        assert!(call.quality.is_finite());
        assert!(approx(call.quality, 100.0));
        assert!(approx(phred_quality(0.0), 100.0));
        assert!(approx(phred_quality(-0.5), 100.0));
    }

    #[test]
    fn test_invalid_threshold() {
        let codec = codec();
        assert!(matches!(
            SnpCaller::new(&codec, 1.5),
            Err(StitchError::Validation(ValidationError::ThresholdOutOfRange(_)))
        ));
        assert!(SnpCaller::new(&codec, f64::NAN).is_err());
    }

    fn snp_chunk() -> ProbabilityChunk {
        ProbabilityChunk::new(
            "c0",
            "chr1",
            vec![
                Position::new(10, 0),
                Position::new(11, 0),
                Position::new(11, 1),
                Position::new(12, 0),
            ],
            vec![
                vec![0.9, 0.05, 0.03, 0.02, 0.0],
                vec![0.05, 0.9, 0.03, 0.02, 0.0],
                vec![0.0, 0.0, 0.0, 1.0, 0.0],
                vec![0.05, 0.5, 0.4, 0.03, 0.02],
            ],
        )
    }

    #[test]
    fn test_call_reference_scenarios() {
        let codec = codec();
        let caller = SnpCaller::new(&codec, 0.1).unwrap();
        let reference = b"AAAAAAAAAAAAAAA";
        let chunks = vec![snp_chunk()];

        let mut calls: Vec<VariantCandidate> = Vec::new();
        let written = caller
            .call_reference("chr1", &chunks, reference, &MidpointResolver, &mut calls)
            .unwrap();

        assert_eq!(written, 2);
        assert_eq!(calls[0].position, 11);
        assert_eq!(calls[0].ref_base, 'A');
        assert_eq!(calls[0].alts, vec!['C']);
        assert_eq!(calls[0].genotype, Genotype::HomozygousAlt);
        assert_eq!(calls[0].filter, "PASS");
        assert!(approx(calls[0].info.ref_prob, 0.05));
        assert_eq!(calls[0].info.secondary_label, 'A');

        assert_eq!(calls[1].position, 12);
        assert_eq!(calls[1].alts, vec!['C', 'G']);
        assert_eq!(calls[1].genotype, Genotype::HeterozygousAltAlt);
        assert_eq!(calls[1].info.secondary_label, 'G');
    }

    #[test]
    fn test_lowercase_and_unknown_reference_bases() {
        let codec = codec();
        let caller = SnpCaller::new(&codec, 0.1).unwrap();
        let chunks = vec![snp_chunk()];

        let mut calls: Vec<VariantCandidate> = Vec::new();
        caller
            .call_reference("chr1", &chunks, b"aaaaaaaaaaacNaa", &MidpointResolver, &mut calls)
            .unwrap();
        // 11 is soft-masked 'c' (matches the call), 12 is 'N' (not a label)
        assert!(calls.is_empty());

        let chunk = snp_chunk();
        let trimmed = TrimmedChunk {
            chunk: &chunk,
            rows: 0..chunk.len(),
            is_span_end: true,
        };
        let block = caller.call_block(&trimmed, b"AAAAAAAAAANNNAA").unwrap();
        assert_eq!(block.unlabelled, 3);
        assert!(block.variants.is_empty());
    }

    #[test]
    fn test_missing_reference_base_fails() {
        let codec = codec();
        let caller = SnpCaller::new(&codec, 0.1).unwrap();
        let chunks = vec![snp_chunk()];
        let mut calls: Vec<VariantCandidate> = Vec::new();
        let result =
            caller.call_reference("chr1", &chunks, b"AAAAAAAAAAAA", &MidpointResolver, &mut calls);
        assert!(matches!(
            result,
            Err(StitchError::ReferenceSymbolMissing { position: 12, .. })
        ));
    }

    /// Chunk over consecutive majors starting at `start`, one base per major
    fn bases_chunk(name: &str, start: u64, bases: &str) -> ProbabilityChunk {
        let symbols = codec().symbols().to_vec();
        ProbabilityChunk::new(
            name,
            "chr1",
            (0..bases.len() as u64).map(|i| Position::new(start + i, 0)).collect(),
            bases
                .chars()
                .map(|b| symbols.iter().map(|&s| if s == b { 1.0 } else { 0.0 }).collect())
                .collect(),
        )
    }

    #[test]
    fn test_overlapping_chunks_call_each_position_once() {
        let codec = codec();
        let caller = SnpCaller::new(&codec, 0.1).unwrap();
        // c0/c1 split between majors 7 and 8, c1/c2 between 13 and 14. Each
        // chunk disagrees with its neighbour on the rows it gives up.
        let chunks = vec![
            bases_chunk("c0", 0, "AAAAACCCTT"),
            bases_chunk("c1", 6, "GGCCAAACTA"),
            bases_chunk("c2", 12, "AGCAAAAA"),
        ];

        let mut calls: Vec<VariantCandidate> = Vec::new();
        let written = caller
            .call_reference("chr1", &chunks, &[b'A'; 20], &MidpointResolver, &mut calls)
            .unwrap();

        let positions: Vec<u64> = calls.iter().map(|v| v.position).collect();
        assert_eq!(positions, vec![5, 6, 7, 8, 9, 13, 14]);
        assert_eq!(written, 7);
        assert!(calls.iter().all(|v| v.alts == vec!['C']));
        assert!(calls.iter().all(|v| v.genotype == Genotype::HomozygousAlt));
    }

    #[test]
    fn test_failed_reference_writes_nothing() {
        let codec = codec();
        let caller = SnpCaller::new(&codec, 0.1).unwrap();
        // The first block calls a C at 2; the second runs past the reference.
        let chunks = vec![bases_chunk("c0", 0, "AACAAAAA"), bases_chunk("c1", 6, "AAAAAAAA")];

        let mut calls: Vec<VariantCandidate> = Vec::new();
        let result =
            caller.call_reference("chr1", &chunks, &[b'A'; 10], &MidpointResolver, &mut calls);
        assert!(matches!(
            result,
            Err(StitchError::ReferenceSymbolMissing { position: 10, .. })
        ));
        assert!(calls.is_empty());
    }

    #[test]
    fn test_call_variants_report_matches_sink() {
        let store = ChunkStore::new(
            codec().symbols().to_vec(),
            '-',
            vec![bases_chunk("c0", 0, "AACAAAAA"), bases_chunk("c1", 6, "AAAAAAAA")],
        );
        let index = ChunkIndex::from_stores(vec![store]).unwrap();
        let reference = ReferenceSequences::from_sequences(vec![("chr1".to_string(), vec![b'A'; 10])]);

        let mut calls: Vec<VariantCandidate> = Vec::new();
        let report = call_variants(
            &index,
            &reference,
            &["chr1".to_string()],
            &MidpointResolver,
            0.1,
            &mut calls,
        )
        .unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.variants_written, calls.len());
        assert!(calls.is_empty());
    }

    #[test]
    fn test_narrow_row_is_an_error() {
        let codec = codec();
        let caller = SnpCaller::new(&codec, 0.1).unwrap();
        let mut chunk = snp_chunk();
        chunk.label_probs[1] = vec![0.2, 0.8];

        let mut calls: Vec<VariantCandidate> = Vec::new();
        let result = caller.call_reference(
            "chr1",
            &[chunk],
            b"AAAAAAAAAAAAAAA",
            &MidpointResolver,
            &mut calls,
        );
        assert!(matches!(
            result,
            Err(StitchError::InvalidChunk {
                source: ValidationError::RowWidth { row: 1, expected: 5, found: 2 },
                ..
            })
        ));
        assert!(calls.is_empty());
    }
}
