//! Post-processing of consensus records against the draft they polish.

use std::collections::HashMap;
use std::ops::Range;

use tracing::info;

use crate::core::chunk::Position;
use crate::core::record::ConsensusRecord;
use crate::parsing::fasta::ReferenceSequences;
use crate::stitching::{ReferenceLookup, StitchError};

/// A whole draft contig with polished spans spliced in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilledContig {
    pub name: String,
    pub sequence: String,

    /// Draft ranges copied through unpolished (0-based, end exclusive)
    pub gaps: Vec<Range<u64>>,
}

impl FilledContig {
    /// True when no consensus covered any part of the contig
    #[must_use]
    pub fn is_unpolished(&self) -> bool {
        self.gaps.len() == 1 && self.gaps[0].start == 0 && self.gaps[0].end == self.sequence.len() as u64
    }
}

/// Merge consecutive records of a reference whose coordinates abut.
///
/// A record starting on the major right after the previous record's last
/// major continues it without a coverage gap.
#[must_use]
pub fn collapse_neighbours(records: Vec<ConsensusRecord>) -> Vec<ConsensusRecord> {
    let mut collapsed: Vec<ConsensusRecord> = Vec::with_capacity(records.len());

    for record in records {
        if let Some(last) = collapsed.last_mut() {
            if last.ref_name == record.ref_name
                && record.start == Position::new(last.end.major + 1, 0)
            {
                last.sequence.push_str(&record.sequence);
                last.end = record.end;
                continue;
            }
        }
        collapsed.push(record);
    }

    collapsed
}

/// Fill the coverage gaps of each polished contig with draft sequence.
///
/// Contigs are returned in draft order: polished contigs first, then draft
/// contigs that no record touched, copied unchanged.
///
/// # Errors
///
/// Returns `StitchError::ReferenceMissing` if a record names a contig that is
/// not in the draft.
pub fn fill_gaps(
    records: &[ConsensusRecord],
    draft: &ReferenceSequences,
) -> Result<Vec<FilledContig>, StitchError> {
    let mut by_ref: HashMap<&str, Vec<&ConsensusRecord>> = HashMap::new();
    for record in records {
        if draft.fetch(&record.ref_name).is_none() {
            return Err(StitchError::ReferenceMissing(record.ref_name.clone()));
        }
        by_ref.entry(record.ref_name.as_str()).or_default().push(record);
    }

    let mut polished = Vec::new();
    let mut missing = Vec::new();

    for name in draft.names() {
        let Some(draft_seq) = draft.fetch(name) else {
            continue;
        };
        match by_ref.get_mut(name.as_str()) {
            Some(spans) => {
                spans.sort_by_key(|r| r.start);
                polished.push(splice(name, draft_seq, spans));
            }
            None => {
                info!("Copying unpolished contig {}.", name);
                missing.push(FilledContig {
                    name: name.clone(),
                    sequence: String::from_utf8_lossy(draft_seq).into_owned(),
                    gaps: vec![0..draft_seq.len() as u64],
                });
            }
        }
    }

    polished.extend(missing);
    Ok(polished)
}

fn splice(name: &str, draft: &[u8], spans: &[&ConsensusRecord]) -> FilledContig {
    let draft_len = draft.len() as u64;
    let mut sequence = String::new();
    let mut gaps = Vec::new();
    let mut cursor = 0u64;

    let mut copy_draft = |from: u64, to: u64, sequence: &mut String| {
        let to = to.min(draft_len);
        if to > from {
            sequence.push_str(&String::from_utf8_lossy(&draft[from as usize..to as usize]));
            gaps.push(from..to);
        }
    };

    for span in spans {
        // A span opening on an insertion still owes the draft base it follows
        let gap_end = if span.start.is_major() {
            span.start.major
        } else {
            span.start.major + 1
        };
        copy_draft(cursor, gap_end, &mut sequence);
        sequence.push_str(&span.sequence);
        cursor = cursor.max(span.end.major + 1);
    }
    copy_draft(cursor, draft_len, &mut sequence);

    FilledContig {
        name: name.to_string(),
        sequence,
        gaps,
    }
}
