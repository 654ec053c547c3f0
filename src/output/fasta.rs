//! FASTA text output, one header line and one sequence line per record.

use std::io::Write;

use crate::core::record::ConsensusRecord;
use crate::output::WriteError;
use crate::stitching::gaps::FilledContig;

/// Write consensus records named by their `ref:start-end` key.
///
/// # Errors
///
/// Returns `WriteError::Io` on write failure.
pub fn write_consensus<W: Write>(writer: &mut W, records: &[ConsensusRecord]) -> Result<(), WriteError> {
    for record in records {
        writeln!(writer, ">{}", record.key())?;
        writeln!(writer, "{}", record.sequence)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write gap-filled contigs under their draft names.
///
/// # Errors
///
/// Returns `WriteError::Io` on write failure.
pub fn write_filled<W: Write>(writer: &mut W, contigs: &[FilledContig]) -> Result<(), WriteError> {
    for contig in contigs {
        writeln!(writer, ">{}", contig.name)?;
        writeln!(writer, "{}", contig.sequence)?;
    }
    writer.flush()?;
    Ok(())
}
