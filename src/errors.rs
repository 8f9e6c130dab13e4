use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub(crate) enum Error {
    #[error("paired records are at different positions: {a_pos} vs {b_pos}")]
    PositionMismatch { a_pos: u64, b_pos: u64 },
    #[error("paired records at position {pos} are on different contigs: {a_chrom} vs {b_chrom}")]
    ContigMismatch {
        a_chrom: String,
        b_chrom: String,
        pos: u64,
    },
    #[error("call sets do not contain the same records: the {exhausted} input ended first")]
    UnpairedRecord { exhausted: String },
    #[error(
        "genotype at position {pos} calls ALT allele {index} but the record only has {available}"
    )]
    AltAlleleOutOfBounds {
        pos: u64,
        index: usize,
        available: usize,
    },
    #[error("record has no genotypes for any sample")]
    MissingGenotypes,
    #[error("FORMAT/{tag} at position {pos} has no value for allele index {index}")]
    MissingFormatValue { tag: String, pos: u64, index: usize },
    #[error("record at position {pos} does not define a chromosome")]
    RecordMissingChrom { pos: u64 },
    #[error("unexpected heterozygous genotype {genotype}")]
    UnexpectedHetGenotype { genotype: String },
    #[error("minimum coverage ({min}) is more than maximum coverage ({max})")]
    InvalidCoverageThresholds { min: i32, max: i32 },
    #[error("strand bias percentage must be between 0 and 50, got {percent}")]
    InvalidStrandBiasPercent { percent: u8 },
    #[error("contig {contig} occurs multiple times in the FASTA input")]
    DuplicateContig { contig: String },
    #[error("expected at most one feature {side} of {start}-{end}, found {count}")]
    AmbiguousNeighbour {
        side: &'static str,
        start: u64,
        end: u64,
        count: usize,
    },
    #[error("contig {contig} from the GFF input is missing from the FASTA input")]
    UnknownContig { contig: String },
    #[error("output file {path} already exists")]
    OutputFileExists { path: PathBuf },
}
