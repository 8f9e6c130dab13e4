use std::path::PathBuf;

use anyhow::Result;
use structopt::clap::AppSettings;
use structopt::StructOpt;

use crate::concordance;
use crate::filtration::{self, Filter};
use crate::mask::PositionMask;
use crate::splitting;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "varcord",
    about = "Genotype concordance, threshold filtering and reference splitting \
             for variant call benchmarks.",
    global_settings = &[AppSettings::ColoredHelp]
)]
pub struct Varcord {
    #[structopt(short, long, global = true, help = "Turns on debug-level logging.")]
    pub verbose: bool,
    #[structopt(subcommand)]
    pub command: Command,
}

#[derive(Debug, StructOpt)]
pub enum Command {
    #[structopt(
        name = "concordance",
        about = "Classify the genotype agreement of a truth and a query call set. \
                 Both inputs must contain the same sites in the same order."
    )]
    Concordance {
        #[structopt(parse(from_os_str), help = "VCF/BCF with the truth calls.")]
        truth: PathBuf,
        #[structopt(parse(from_os_str), help = "VCF/BCF with the query calls.")]
        query: PathBuf,
        #[structopt(
            short,
            long,
            parse(from_os_str),
            help = "Tab-separated file the per-site classifications are written to."
        )]
        output: PathBuf,
        #[structopt(
            short,
            long,
            parse(from_os_str),
            help = "BED file with positions to exclude from the comparison."
        )]
        mask: Option<PathBuf>,
        #[structopt(
            long,
            help = "Classify calls that fail the FILTER column instead of comparing their genotypes."
        )]
        apply_filter: bool,
        #[structopt(
            short,
            long,
            parse(from_os_str),
            help = "JSON file the outcome tallies and summary metrics are written to."
        )]
        summary: Option<PathBuf>,
    },
    #[structopt(
        name = "filter",
        about = "Assess each record against coverage, strand bias, gaps and genotype \
                 confidence thresholds and tag its FILTER column accordingly. \
                 Null calls are assessed on the reference allele metrics."
    )]
    Filter {
        #[structopt(
            short = "i",
            long = "in-vcf",
            parse(from_os_str),
            help = "VCF to apply filters to (if omitted, read from STDIN)."
        )]
        input: Option<PathBuf>,
        #[structopt(
            short = "o",
            long = "out-vcf",
            parse(from_os_str),
            help = "Tagged VCF (if omitted, write to STDOUT)."
        )]
        output: Option<PathBuf>,
        #[structopt(
            short = "d",
            long,
            default_value = "0",
            help = "Minimum k-mer coverage for the called allele. This filter has ID: ld. \
                    Set to 0 to disable."
        )]
        min_covg: i32,
        #[structopt(
            short = "D",
            long,
            default_value = "0",
            help = "Maximum k-mer coverage for the called allele. This filter has ID: hd. \
                    Set to 0 to disable."
        )]
        max_covg: i32,
        #[structopt(
            short = "s",
            long,
            default_value = "0",
            help = "Filter a record if either strand holds less than INT% of the k-mer \
                    coverage on the called allele (at most 50). This filter has ID: sb. \
                    Set to 0 to disable."
        )]
        min_strand_bias: u8,
        #[structopt(
            short = "g",
            long,
            default_value = "0.0",
            help = "Minimum genotype confidence (GT_CONF) score. This filter has ID: lgc. \
                    Set to 0 to disable."
        )]
        min_gt_conf: f32,
        #[structopt(
            short = "G",
            long,
            default_value = "0.0",
            help = "Maximum fraction of coverage gaps (GAPS) on the called allele. \
                    This filter has ID: hg. Set to 0 to disable."
        )]
        max_gaps: f32,
        #[structopt(
            short = "F",
            long,
            help = "Append to a failing FILTER column instead of replacing it."
        )]
        no_overwrite: bool,
    },
    #[structopt(
        name = "split",
        about = "Split a reference FASTA into one file per locus: the annotated \
                 features of the selected types and the intergenic regions between them."
    )]
    Split {
        #[structopt(
            short,
            long,
            parse(from_os_str),
            help = "FASTA file to split (if omitted, read from STDIN)."
        )]
        fasta: Option<PathBuf>,
        #[structopt(
            short,
            long,
            parse(from_os_str),
            help = "GFF3 file to base the split coordinates on."
        )]
        gff: PathBuf,
        #[structopt(
            short,
            long,
            parse(from_os_str),
            default_value = ".",
            help = "Directory to write the output files to."
        )]
        outdir: PathBuf,
        #[structopt(
            long,
            default_value = "gene",
            help = "Feature types to split on. Pass the option multiple times for \
                    more than one type."
        )]
        types: Vec<String>,
        #[structopt(
            long,
            default_value = "0",
            help = "Minimum length of the intergenic regions to output."
        )]
        min_igr_len: u64,
        #[structopt(
            long,
            help = "Maximum length of the intergenic regions to output. Set to 0 to \
                    disable intergenic output entirely; omit for no upper bound."
        )]
        max_igr_len: Option<u64>,
        #[structopt(long, help = "Don't merge overlapping features.")]
        no_merge: bool,
    },
}

pub fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    fern::Dispatch::new()
        .format(|out, message, record| out.finish(format_args!("[{}] {}", record.level(), message)))
        .level(level)
        .chain(std::io::stderr())
        .apply()?;
    Ok(())
}

pub fn run(opt: Varcord) -> Result<()> {
    match opt.command {
        Command::Concordance {
            truth,
            query,
            output,
            mask,
            apply_filter,
            summary,
        } => {
            let mask = mask.map(PositionMask::from_bed).transpose()?;
            let mut caller = concordance::caller::CallerBuilder::default()
                .truth_path(truth)
                .query_path(query)
                .mask(mask)
                .apply_filter(apply_filter)
                .output(output)
                .summary_path(summary)
                .build()?;
            caller.call()
        }
        Command::Filter {
            input,
            output,
            min_covg,
            max_covg,
            min_strand_bias,
            min_gt_conf,
            max_gaps,
            no_overwrite,
        } => {
            let filter = Filter::new(min_covg, max_covg, min_strand_bias, min_gt_conf, max_gaps)?;
            let mut caller = filtration::caller::CallerBuilder::default()
                .input(input)
                .output(output)
                .filter(filter)
                .overwrite(!no_overwrite)
                .build()?;
            caller.call()
        }
        Command::Split {
            fasta,
            gff,
            outdir,
            types,
            min_igr_len,
            max_igr_len,
            no_merge,
        } => {
            let mut caller = splitting::caller::CallerBuilder::default()
                .fasta(fasta)
                .gff(gff)
                .outdir(outdir)
                .types(types)
                .min_igr_len(min_igr_len)
                .max_igr_len(max_igr_len)
                .no_merge(no_merge)
                .build()?;
            caller.call()
        }
    }
}
