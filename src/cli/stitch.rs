use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use clap::Args;
use tracing::info;

use crate::cli::{select_references, OutputFormat, RunSummary};
use crate::output::fasta::{write_consensus, write_filled};
use crate::parsing::fasta::ReferenceSequences;
use crate::parsing::probs::ChunkIndex;
use crate::stitching::gaps::{collapse_neighbours, fill_gaps};
use crate::stitching::overlap::MidpointResolver;
use crate::stitching::stitcher::{stitch, StitchReport};

#[derive(Args)]
pub struct StitchArgs {
    /// Chunk store files (.json, bincode, optionally .gz)
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output FASTA file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Limit processing to these references (`name` or `name:start-end`)
    #[arg(long, num_args = 1..)]
    pub regions: Vec<String>,

    /// Draft FASTA whose uncovered ranges fill the gaps between consensus spans
    #[arg(long, value_name = "DRAFT")]
    pub fill_gaps: Option<PathBuf>,

    /// Join consecutive records whose coordinates abut
    #[arg(long, conflicts_with = "fill_gaps")]
    pub join_adjacent: bool,
}

pub fn run(args: StitchArgs, format: OutputFormat) -> anyhow::Result<()> {
    let index = ChunkIndex::open(&args.inputs)?;
    let ref_names = select_references(&args.regions, &index);

    let StitchReport { records, failures } = stitch(&index, &ref_names, &MidpointResolver);

    let mut writer = BufWriter::new(File::create(&args.output)?);
    let written = if let Some(draft_path) = &args.fill_gaps {
        let draft = ReferenceSequences::from_path(draft_path)?;
        let contigs = fill_gaps(&records, &draft)?;
        for contig in contigs.iter().filter(|c| !c.gaps.is_empty()) {
            if contig.is_unpolished() {
                info!("No consensus for {}, copied from the draft.", contig.name);
            } else {
                info!(
                    "Filled {} gaps in {} from the draft.",
                    contig.gaps.len(),
                    contig.name
                );
            }
        }
        write_filled(&mut writer, &contigs)?;
        contigs.len()
    } else {
        let records = if args.join_adjacent {
            collapse_neighbours(records)
        } else {
            records
        };
        write_consensus(&mut writer, &records)?;
        records.len()
    };

    info!("Wrote {} sequences to {}.", written, args.output.display());

    let summary = RunSummary::new("stitch", &ref_names, written, &failures);
    summary.print(format, "sequences")?;
    summary.into_result()
}
