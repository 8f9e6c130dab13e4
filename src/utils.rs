//! Small helpers around htslib readers, writers and records.

use std::path::PathBuf;

use anyhow::{Context, Result};
use rust_htslib::bcf;

use crate::errors::Error;

/// Open a VCF/BCF for reading; stdin when no path is given.
pub(crate) fn vcf_reader(path: Option<&PathBuf>) -> Result<bcf::Reader> {
    match path {
        Some(path) => bcf::Reader::from_path(path)
            .with_context(|| format!("failed to open {}", path.display())),
        None => bcf::Reader::from_stdin().context("failed to read VCF from stdin"),
    }
}

/// Open an uncompressed VCF writer; stdout when no path is given.
pub(crate) fn vcf_writer(path: Option<&PathBuf>, header: &bcf::Header) -> Result<bcf::Writer> {
    match path {
        Some(path) => bcf::Writer::from_path(path, header, true, bcf::Format::Vcf)
            .with_context(|| format!("failed to create {}", path.display())),
        None => bcf::Writer::from_stdout(header, true, bcf::Format::Vcf)
            .context("failed to write VCF to stdout"),
    }
}

/// Contig name of a record.
pub(crate) fn chrom_name(record: &bcf::Record) -> Result<String> {
    let rid = record.rid().ok_or(Error::RecordMissingChrom {
        pos: record.pos() as u64 + 1,
    })?;
    let name = record.header().rid2name(rid)?;
    Ok(String::from_utf8_lossy(name).into_owned())
}
