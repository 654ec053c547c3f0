use proptest::prelude::*;
use probstitch::stitching::stitcher::stitch_reference;
use probstitch::stitching::variants::{phred_quality, SnpCaller, TopTwo};
use probstitch::{LabelCodec, MidpointResolver, Position, ProbabilityChunk};

const SYMBOLS: [char; 5] = ['A', 'C', 'G', 'T', '*'];

fn codec() -> LabelCodec {
    LabelCodec::new(SYMBOLS.to_vec(), '*').expect("valid alphabet")
}

fn one_hot(symbol: char) -> Vec<f32> {
    SYMBOLS.iter().map(|&s| if s == symbol { 1.0 } else { 0.0 }).collect()
}

/// Overlapping windows over `0..n`: each chunk starts strictly inside the
/// previous one and ends strictly after it.
fn layout(n: usize, first_len: usize, params: &[(usize, usize)]) -> Vec<std::ops::Range<usize>> {
    let mut windows = Vec::new();
    let mut start = 0;
    let mut end = first_len.clamp(2, n);
    let mut i = 0;
    loop {
        windows.push(start..end);
        if end == n {
            return windows;
        }
        let (step, extend) = params[i % params.len()];
        i += 1;
        let next_start = start + 1 + step % (end - start - 1);
        end = (end + 1 + extend % 20).min(n);
        start = next_start;
    }
}

proptest! {
    #[test]
    fn overlapping_chunks_reproduce_truth(
        truth in proptest::collection::vec(prop_oneof![
            Just('A'), Just('C'), Just('G'), Just('T')
        ], 2..200),
        first_len in 2usize..40,
        params in proptest::collection::vec((0usize..64, 0usize..64), 1..8),
    ) {
        let windows = layout(truth.len(), first_len, &params);
        let chunks: Vec<ProbabilityChunk> = windows
            .iter()
            .enumerate()
            .map(|(i, w)| {
                ProbabilityChunk::new(
                    format!("c{i}"),
                    "chr1",
                    w.clone().map(|m| Position::new(m as u64, 0)).collect(),
                    truth[w.clone()].iter().map(|&b| one_hot(b)).collect(),
                )
            })
            .collect();

        let records = stitch_reference("chr1", &chunks, &MidpointResolver, &codec())
            .expect("stitching succeeds");
        let expected: String = truth.iter().collect();

        prop_assert_eq!(records.len(), 1, "overlapping coverage yields one record");
        prop_assert_eq!(&records[0].sequence, &expected, "no position duplicated or lost");
        prop_assert_eq!(records[0].start, Position::new(0, 0));
        prop_assert_eq!(records[0].end, Position::new(truth.len() as u64 - 1, 0));
    }

    #[test]
    fn homozygous_and_heterozygous_are_exclusive(
        row in proptest::collection::vec(0.0f32..1.0, 5),
        ref_index in 0usize..4,
        threshold in 0.0f64..=1.0,
    ) {
        let codec = codec();
        let caller = SnpCaller::new(&codec, threshold).expect("threshold in range");
        let top = TopTwo::from_row(&row);
        prop_assert!(!(caller.is_homozygous(&top, ref_index) && caller.is_heterozygous(&top)));
        prop_assert!(top.primary != top.secondary);
        prop_assert!(top.primary_prob >= top.secondary_prob);
    }

    #[test]
    fn homozygous_quality_is_monotonic(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let q_low = phred_quality(1.0 - low);
        let q_high = phred_quality(1.0 - high);
        prop_assert!(q_low <= q_high);
        prop_assert!(q_high.is_finite());
        prop_assert!(q_high <= 100.0 + 1e-9);
    }

    #[test]
    fn decoding_strips_gaps(labels in proptest::collection::vec(0usize..5, 0..100)) {
        let codec = codec();
        let rows: Vec<Vec<f32>> = labels.iter().map(|&i| one_hot(SYMBOLS[i])).collect();
        let decoded = codec.decode_rows(rows.iter().map(Vec::as_slice));

        prop_assert!(!decoded.contains('*'));
        prop_assert_eq!(decoded.len(), labels.iter().filter(|&&i| i != 4).count());
    }
}
