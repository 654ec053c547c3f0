//! VCF 4.1 output for SNP calls.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::core::record::VariantCandidate;
use crate::output::WriteError;
use crate::stitching::variants::VariantSink;

/// Header content that varies between runs
#[derive(Debug, Clone)]
pub struct VcfHeader {
    /// `(name, length)` for every contig that may appear
    pub contigs: Vec<(String, u64)>,
    pub sample: String,
    pub reference: Option<String>,
}

impl VcfHeader {
    #[must_use]
    pub fn new(contigs: Vec<(String, u64)>, sample: impl Into<String>) -> Self {
        Self {
            contigs,
            sample: sample.into(),
            reference: None,
        }
    }

    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    fn render(&self) -> String {
        let mut lines = vec![
            "##fileformat=VCFv4.1".to_string(),
            format!("##fileDate={}", chrono::Local::now().format("%Y%m%d")),
            format!("##source={} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        ];
        if let Some(reference) = &self.reference {
            lines.push(format!("##reference={reference}"));
        }
        for (name, length) in &self.contigs {
            lines.push(format!("##contig=<ID={name},length={length}>"));
        }
        lines.extend(
            [
                "##FILTER=<ID=PASS,Description=\"All filters passed\">",
                "##INFO=<ID=ref_prob,Number=1,Type=Float,Description=\"Probability of the reference base\">",
                "##INFO=<ID=primary_prob,Number=1,Type=Float,Description=\"Probability of the most likely label\">",
                "##INFO=<ID=secondary_prob,Number=1,Type=Float,Description=\"Probability of the second most likely label\">",
                "##INFO=<ID=secondary_label,Number=1,Type=String,Description=\"Second most likely label\">",
                "##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">",
                "##FORMAT=<ID=GQ,Number=1,Type=Integer,Description=\"Genotype quality\">",
            ]
            .map(String::from),
        );
        lines.push(format!(
            "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\t{}",
            self.sample
        ));

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }
}

/// Streams variant records after a header.
///
/// Records must arrive in position order within each contig.
pub struct VcfWriter<W: Write> {
    writer: W,
    last: Option<(String, u64)>,
    records_written: usize,
}

impl VcfWriter<BufWriter<File>> {
    /// Create `path` and write the header.
    ///
    /// # Errors
    ///
    /// Returns `WriteError::Io` if the file cannot be created or written.
    pub fn create(path: &Path, header: &VcfHeader) -> Result<Self, WriteError> {
        Self::new(BufWriter::new(File::create(path)?), header)
    }
}

impl<W: Write> VcfWriter<W> {
    /// Wrap `writer` and write the header to it.
    ///
    /// # Errors
    ///
    /// Returns `WriteError::Io` if the header cannot be written.
    pub fn new(mut writer: W, header: &VcfHeader) -> Result<Self, WriteError> {
        writer.write_all(header.render().as_bytes())?;
        Ok(Self {
            writer,
            last: None,
            records_written: 0,
        })
    }

    #[must_use]
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Flush and hand back the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns `WriteError::Io` if flushing fails.
    pub fn finish(mut self) -> Result<W, WriteError> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> VariantSink for VcfWriter<W> {
    fn write_variant(&mut self, variant: &VariantCandidate) -> Result<(), WriteError> {
        if let Some((ref_name, previous)) = &self.last {
            if *ref_name == variant.ref_name && variant.position < *previous {
                return Err(WriteError::OutOfOrder {
                    ref_name: ref_name.clone(),
                    previous: previous + 1,
                    position: variant.position + 1,
                });
            }
        }

        let alts: Vec<String> = variant.alts.iter().map(char::to_string).collect();
        let info = &variant.info;
        writeln!(
            self.writer,
            "{chrom}\t{pos}\t.\t{ref_base}\t{alt}\t{qual:.3}\t{filter}\t\
             ref_prob={ref_prob:.6};primary_prob={primary_prob:.6};\
             secondary_prob={secondary_prob:.6};secondary_label={secondary_label}\t\
             GT:GQ\t{gt}:{gq:.0}",
            chrom = variant.ref_name,
            pos = variant.position + 1,
            ref_base = variant.ref_base,
            alt = alts.join(","),
            qual = variant.quality,
            filter = variant.filter,
            ref_prob = info.ref_prob,
            primary_prob = info.primary_prob,
            secondary_prob = info.secondary_prob,
            secondary_label = info.secondary_label,
            gt = variant.genotype,
            gq = variant.quality,
        )?;

        self.last = Some((variant.ref_name.clone(), variant.position));
        self.records_written += 1;
        Ok(())
    }
}
