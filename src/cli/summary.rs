use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::parsing::probs::{ChunkIndex, ReferenceSummary};
use crate::stitching::ChunkSource;

#[derive(Args)]
pub struct SummaryArgs {
    /// Chunk store files (.json, bincode, optionally .gz)
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,
}

#[derive(Serialize)]
struct StoreSummary {
    labels: String,
    gap_symbol: char,
    chunks: usize,
    references: Vec<ReferenceSummary>,
}

pub fn run(args: SummaryArgs, format: OutputFormat) -> anyhow::Result<()> {
    let index = ChunkIndex::open(&args.inputs)?;
    let codec = index.label_codec();

    let summary = StoreSummary {
        labels: codec.symbols().iter().collect(),
        gap_symbol: codec.gap_symbol(),
        chunks: index.len(),
        references: index.summaries(),
    };

    match format {
        OutputFormat::Text => print_text(&summary),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormat::Tsv => print_tsv(&summary),
    }

    Ok(())
}

fn print_text(summary: &StoreSummary) {
    println!("Chunk Store Summary");
    println!("{}", "=".repeat(60));
    println!("Labels:     {} (gap '{}')", summary.labels, summary.gap_symbol);
    println!("Chunks:     {}", summary.chunks);
    println!("References: {}", summary.references.len());

    if summary.references.is_empty() {
        return;
    }

    println!();
    println!("{:<30} {:>8} {:>14} {:>14}", "Reference", "Chunks", "Start", "End");
    println!("{}", "-".repeat(69));
    for reference in &summary.references {
        println!(
            "{:<30} {:>8} {:>14} {:>14}",
            reference.ref_name,
            reference.chunk_count,
            reference.start.to_string(),
            reference.end.to_string()
        );
    }
}

fn print_tsv(summary: &StoreSummary) {
    println!("ref_name\tchunks\tstart\tend");
    for reference in &summary.references {
        println!(
            "{}\t{}\t{}\t{}",
            reference.ref_name, reference.chunk_count, reference.start, reference.end
        );
    }
}
