//! # probstitch
//!
//! A library for turning windows of per-position label probabilities into
//! consensus sequences and SNP calls.
//!
//! Neural consensus models are usually run over overlapping windows ("chunks")
//! of an alignment. Each chunk carries, for every reference position (and every
//! inserted position following it), a probability distribution over a small
//! label alphabet such as `ACGT*`. `probstitch` walks the chunks of each
//! reference in order, trims their overlaps so every position is used exactly
//! once, and then either decodes the result or classifies it against the
//! reference.
//!
//! ## Features
//!
//! - **Consensus stitching**: arg-max decoding with gap symbols removed, one
//!   record per span of contiguous coverage
//! - **Gap filling**: splice consensus spans into the draft they polish
//! - **SNP calling**: homozygous and heterozygous calls with phred qualities
//! - **Per-reference isolation**: a failing reference never stops the others
//!
//! ## Example
//!
//! ```rust,no_run
//! use probstitch::parsing::fasta::ReferenceSequences;
//! use probstitch::parsing::probs::ChunkIndex;
//! use probstitch::stitching::overlap::MidpointResolver;
//! use probstitch::stitching::variants::{call_variants, DEFAULT_THRESHOLD};
//! use probstitch::VariantCandidate;
//! use std::path::{Path, PathBuf};
//!
//! let index = ChunkIndex::open(&[PathBuf::from("probs.bin")]).unwrap();
//! let reference = ReferenceSequences::from_path(Path::new("ref.fa")).unwrap();
//!
//! let mut calls: Vec<VariantCandidate> = Vec::new();
//! let report = call_variants(
//!     &index,
//!     &reference,
//!     &["chr1".to_string()],
//!     &MidpointResolver,
//!     DEFAULT_THRESHOLD,
//!     &mut calls,
//! )
//! .unwrap();
//!
//! for call in &calls {
//!     println!("{}:{} {} {:.1}", call.ref_name, call.position + 1, call.genotype, call.quality);
//! }
//! assert!(report.failures.is_empty());
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Positions, chunks, label alphabets and output records
//! - [`stitching`]: Chunk walking, consensus stitching and SNP calling
//! - [`parsing`]: Chunk stores and reference FASTA
//! - [`output`]: FASTA and VCF writers
//! - [`cli`]: Command-line interface implementation

pub mod cli;
pub mod core;
pub mod output;
pub mod parsing;
pub mod stitching;
pub mod utils;

// Re-export commonly used types for convenience
pub use core::chunk::{Position, ProbabilityChunk};
pub use core::labels::LabelCodec;
pub use core::record::{ConsensusRecord, Genotype, VariantCandidate};
pub use parsing::probs::{ChunkIndex, ChunkStore};
pub use stitching::overlap::{MidpointResolver, Overlap, OverlapResolver};
pub use stitching::stitcher::{stitch, StitchReport};
pub use stitching::variants::{call_variants, VariantReport, VariantSink};
