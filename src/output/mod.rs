//! Writers for stitched consensus (FASTA) and variant calls (VCF).

pub mod fasta;
pub mod vcf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Variant at {ref_name}:{position} written after {ref_name}:{previous}")]
    OutOfOrder {
        ref_name: String,
        previous: u64,
        position: u64,
    },
}
