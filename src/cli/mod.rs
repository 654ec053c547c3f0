//! Command-line interface for probstitch.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **stitch**: Stitch chunk stores into consensus FASTA
//! - **snps**: Call SNPs from chunk stores against a reference FASTA
//! - **summary**: Describe the contents of chunk stores
//!
//! ## Usage
//!
//! ```text
//! # Consensus for every reference in two stores
//! probstitch stitch worker0.probs worker1.probs -o consensus.fa
//!
//! # Fill coverage gaps from the draft being polished
//! probstitch stitch probs.bin -o polished.fa --fill-gaps draft.fa
//!
//! # SNPs on two contigs only
//! probstitch snps probs.bin ref.fa -o calls.vcf --regions chr1 chr2:100-200
//!
//! # JSON summary for scripting
//! probstitch summary probs.bin --format json
//! ```

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::core::region::reference_names;
use crate::stitching::{ChunkSource, RunFailure};

pub mod snps;
pub mod stitch;
pub mod summary;

#[derive(Parser)]
#[command(name = "probstitch")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Stitch per-position label probabilities into consensus and SNP calls")]
#[command(
    long_about = "probstitch joins overlapping windows of per-position label probabilities (as produced by a neural consensus model) into one result per reference.\n\nIt can:\n- Decode the stitched windows into consensus FASTA\n- Splice the consensus into the draft it polishes\n- Call homozygous and heterozygous SNPs into VCF"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format for run reports and summaries
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Stitch probability chunks into consensus sequences
    Stitch(stitch::StitchArgs),

    /// Call SNPs from probability chunks
    Snps(snps::SnpsArgs),

    /// Summarize the references covered by chunk stores
    Summary(summary::SummaryArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// References to process: the reduced regions if any, else every reference
/// in the source.
fn select_references<S: ChunkSource + ?Sized>(regions: &[String], source: &S) -> Vec<String> {
    if regions.is_empty() {
        source.ref_names()
    } else {
        reference_names(regions)
    }
}

#[derive(Serialize)]
struct ReferenceStatus {
    ref_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// What a stitch or snps run did, printed once output is written
#[derive(Serialize)]
struct RunSummary {
    command: &'static str,
    written: usize,
    references: Vec<ReferenceStatus>,
}

impl RunSummary {
    fn new(command: &'static str, ref_names: &[String], written: usize, failures: &[RunFailure]) -> Self {
        let references = ref_names
            .iter()
            .map(|name| ReferenceStatus {
                ref_name: name.clone(),
                error: failures
                    .iter()
                    .find(|f| f.ref_name == *name)
                    .map(|f| f.error.to_string()),
            })
            .collect();
        Self {
            command,
            written,
            references,
        }
    }

    fn failed(&self) -> usize {
        self.references.iter().filter(|r| r.error.is_some()).count()
    }

    fn print(&self, format: OutputFormat, unit: &str) -> anyhow::Result<()> {
        match format {
            OutputFormat::Text => {
                println!(
                    "{}: {} references, {} failed, {} {} written",
                    self.command,
                    self.references.len(),
                    self.failed(),
                    self.written,
                    unit
                );
                for status in &self.references {
                    if let Some(error) = &status.error {
                        println!("  {}: {}", status.ref_name, error);
                    }
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(self)?);
            }
            OutputFormat::Tsv => {
                println!("ref_name\tstatus\terror");
                for status in &self.references {
                    match &status.error {
                        Some(error) => println!("{}\tfailed\t{}", status.ref_name, error),
                        None => println!("{}\tok\t", status.ref_name),
                    }
                }
            }
        }
        Ok(())
    }

    /// Error out if any reference failed.
    fn into_result(self) -> anyhow::Result<()> {
        let failed = self.failed();
        if failed > 0 {
            anyhow::bail!("{} of {} references failed", failed, self.references.len());
        }
        Ok(())
    }
}
