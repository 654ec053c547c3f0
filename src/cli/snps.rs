use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::cli::{select_references, OutputFormat, RunSummary};
use crate::output::vcf::{VcfHeader, VcfWriter};
use crate::parsing::fasta::ReferenceSequences;
use crate::parsing::probs::ChunkIndex;
use crate::stitching::overlap::MidpointResolver;
use crate::stitching::variants::{call_variants, DEFAULT_THRESHOLD};
use crate::utils::validation::validate_threshold;

#[derive(Args)]
pub struct SnpsArgs {
    /// Chunk store files (.json, bincode, optionally .gz)
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Reference FASTA the chunks are anchored to
    #[arg(long)]
    pub ref_fasta: PathBuf,

    /// Output VCF file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Limit processing to these references (`name` or `name:start-end`)
    #[arg(long, num_args = 1..)]
    pub regions: Vec<String>,

    /// Secondary-probability threshold separating homozygous and heterozygous calls
    #[arg(long, default_value_t = DEFAULT_THRESHOLD, value_parser = parse_threshold)]
    pub threshold: f64,

    /// Sample name for the VCF genotype column
    #[arg(long, default_value = "SAMPLE")]
    pub sample: String,
}

fn parse_threshold(value: &str) -> Result<f64, String> {
    let threshold: f64 = value.parse().map_err(|e| format!("{e}"))?;
    validate_threshold(threshold).map_err(|e| e.to_string())
}

pub fn run(args: SnpsArgs, format: OutputFormat) -> anyhow::Result<()> {
    let index = ChunkIndex::open(&args.inputs)?;
    let reference = ReferenceSequences::from_path(&args.ref_fasta)?;
    let ref_names = select_references(&args.regions, &index);

    let header = VcfHeader::new(reference.lengths(), &args.sample)
        .with_reference(args.ref_fasta.display().to_string());
    let mut writer = VcfWriter::create(&args.output, &header)?;

    let report = call_variants(
        &index,
        &reference,
        &ref_names,
        &MidpointResolver,
        args.threshold,
        &mut writer,
    )?;
    let records = writer.records_written();
    writer.finish()?;

    info!("Wrote {} variants to {}.", records, args.output.display());

    let summary = RunSummary::new("snps", &ref_names, report.variants_written, &report.failures);
    summary.print(format, "variants")?;
    summary.into_result()
}
