//! Core data types shared by the stitcher and the variant caller.
//!
//! - [`Position`] and [`ProbabilityChunk`]: per-position label probabilities
//!   anchored to reference coordinates
//! - [`LabelCodec`]: the runtime label alphabet, including the gap symbol
//! - [`ConsensusRecord`], [`VariantCandidate`]: the two kinds of output
//! - [`Region`]: region strings reduced to reference names
//!
//! ## Coordinates
//!
//! | Field | Meaning |
//! |-------|---------|
//! | major | 0-based reference base index |
//! | minor | 0 for the aligned call, >0 for bases inserted after it |
//!
//! Consensus keys print majors 1-based (`chr1:1.0-250.0`); VCF `POS` is
//! `major + 1`.

pub mod chunk;
pub mod labels;
pub mod record;
pub mod region;

pub use chunk::{Position, ProbabilityChunk};
pub use labels::{LabelCodec, LabelError};
pub use record::{ConsensusRecord, Genotype, VariantCandidate, VariantInfo};
pub use region::Region;
