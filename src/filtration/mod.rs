//! Threshold filters over the per-allele FORMAT metrics a k-mer based
//! caller attaches to its records: forward/reverse mean coverage, the
//! fraction of allele k-mers without coverage (`GAPS`) and the genotype
//! confidence score (`GT_CONF`). Each enabled threshold contributes one
//! FILTER id; records failing no check are marked `PASS`.

pub(crate) mod caller;

use std::cmp;
use std::fmt;

use anyhow::Result;
use derive_new::new;
use itertools::Itertools;
use rust_htslib::bcf;

use crate::errors::Error;
use crate::variant::VariantRecord;

/// FORMAT tags read from records and FILTER ids written to them.
#[derive(
    Display, Debug, Clone, Copy, EnumString, IntoStaticStr, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub enum Tag {
    #[strum(serialize = "MEAN_FWD_COVG")]
    FwdCovg,
    #[strum(serialize = "MEAN_REV_COVG")]
    RevCovg,
    #[strum(serialize = "ld")]
    LowCovg,
    #[strum(serialize = "hd")]
    HighCovg,
    #[strum(serialize = "sb")]
    StrandBias,
    #[strum(serialize = "GAPS")]
    Gaps,
    #[strum(serialize = "hg")]
    HighGaps,
    #[strum(serialize = "GT_CONF")]
    GtConf,
    #[strum(serialize = "lgc")]
    LowGtConf,
    #[strum(serialize = "PASS")]
    Pass,
}

impl Tag {
    pub(crate) fn as_bytes(self) -> &'static [u8] {
        <&'static str>::from(self).as_bytes()
    }
}

/// Index of the record's called allele within per-allele FORMAT arrays.
fn called_allele_index(record: &bcf::Record) -> Result<usize> {
    record.genotype()?.allele_index()
}

fn format_integer(record: &bcf::Record, tag: Tag, index: usize) -> Result<i32> {
    let values = record.format(tag.as_bytes()).integer()?;
    value_at(values[0], tag, index, record.position())
}

fn format_float(record: &bcf::Record, tag: Tag, index: usize) -> Result<f32> {
    let values = record.format(tag.as_bytes()).float()?;
    value_at(values[0], tag, index, record.position())
}

fn value_at<T: Copy>(sample_values: &[T], tag: Tag, index: usize, pos: u64) -> Result<T> {
    sample_values.get(index).copied().ok_or_else(|| {
        Error::MissingFormatValue {
            tag: tag.to_string(),
            pos,
            index,
        }
        .into()
    })
}

/// Forward and reverse mean k-mer coverage of one allele.
#[derive(new, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Strand {
    forward_covg: i32,
    reverse_covg: i32,
}

impl Strand {
    fn from_record(record: &bcf::Record, allele_index: usize) -> Result<Self> {
        let forward = format_integer(record, Tag::FwdCovg, allele_index)?;
        let reverse = format_integer(record, Tag::RevCovg, allele_index)?;
        Ok(Strand::new(forward, reverse))
    }

    pub(crate) fn total(&self) -> i32 {
        self.forward_covg + self.reverse_covg
    }

    /// Share of the weaker strand in the allele coverage. An uncovered
    /// allele counts as balanced.
    pub(crate) fn ratio(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            1.0
        } else {
            cmp::min(self.forward_covg, self.reverse_covg) as f64 / total as f64
        }
    }
}

/// Which checks a record failed. Renders as the FILTER column value.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct FilterStatus {
    low_covg: bool,
    high_covg: bool,
    low_gt_conf: bool,
    strand_bias: bool,
    high_gaps: bool,
}

impl FilterStatus {
    /// FILTER ids of the failed checks, in reporting order.
    pub(crate) fn failed(&self) -> Vec<Tag> {
        let checks = [
            (self.low_covg, Tag::LowCovg),
            (self.high_covg, Tag::HighCovg),
            (self.low_gt_conf, Tag::LowGtConf),
            (self.strand_bias, Tag::StrandBias),
            (self.high_gaps, Tag::HighGaps),
        ];
        checks
            .iter()
            .filter(|(failed, _)| *failed)
            .map(|(_, tag)| *tag)
            .collect()
    }

    pub(crate) fn is_pass(&self) -> bool {
        self.failed().is_empty()
    }
}

impl fmt::Display for FilterStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let failed = self.failed();
        if failed.is_empty() {
            write!(f, "{}", Tag::Pass)
        } else {
            write!(f, "{}", failed.iter().join(";"))
        }
    }
}

/// The configured thresholds. A threshold of zero disables its check.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    min_covg: i32,
    max_covg: i32,
    min_strand_ratio: f64,
    min_gt_conf: f32,
    max_gaps: f32,
}

impl Filter {
    pub fn new(
        min_covg: i32,
        max_covg: i32,
        min_strand_bias_percent: u8,
        min_gt_conf: f32,
        max_gaps: f32,
    ) -> Result<Self> {
        if min_covg > 0 && max_covg > 0 && min_covg > max_covg {
            return Err(Error::InvalidCoverageThresholds {
                min: min_covg,
                max: max_covg,
            }
            .into());
        }
        if min_strand_bias_percent > 50 {
            return Err(Error::InvalidStrandBiasPercent {
                percent: min_strand_bias_percent,
            }
            .into());
        }
        Ok(Filter {
            min_covg,
            max_covg,
            min_strand_ratio: min_strand_bias_percent as f64 / 100.0,
            min_gt_conf,
            max_gaps,
        })
    }

    /// Evaluate the enabled checks against the metrics of the record's
    /// called allele. Null calls are judged on the reference allele.
    pub(crate) fn status(&self, record: &bcf::Record) -> Result<FilterStatus> {
        let mut status = FilterStatus::default();

        if self.min_covg > 0 || self.max_covg > 0 {
            let covg = Strand::from_record(record, called_allele_index(record)?)?.total();
            status.low_covg = self.min_covg > 0 && covg < self.min_covg;
            status.high_covg = self.max_covg > 0 && covg > self.max_covg;
        }
        if self.min_gt_conf > 0.0 {
            status.low_gt_conf = format_float(record, Tag::GtConf, 0)? < self.min_gt_conf;
        }
        if self.min_strand_ratio > 0.0 {
            let strand = Strand::from_record(record, called_allele_index(record)?)?;
            status.strand_bias = strand.ratio() < self.min_strand_ratio;
        }
        if self.max_gaps > 0.0 {
            let gaps = format_float(record, Tag::Gaps, called_allele_index(record)?)?;
            status.high_gaps = gaps > self.max_gaps;
        }

        Ok(status)
    }

    /// `##FILTER` header lines for the enabled checks.
    pub(crate) fn header_records(&self) -> Vec<String> {
        let mut records = Vec::new();
        if self.min_covg > 0 {
            records.push(format!(
                "##FILTER=<ID={},Description=\"Kmer coverage on called allele less than {}\">",
                Tag::LowCovg,
                self.min_covg
            ));
        }
        if self.max_covg > 0 {
            records.push(format!(
                "##FILTER=<ID={},Description=\"Kmer coverage on called allele more than {}\">",
                Tag::HighCovg,
                self.max_covg
            ));
        }
        if self.min_gt_conf > 0.0 {
            records.push(format!(
                "##FILTER=<ID={},Description=\"Genotype confidence score less than {}\">",
                Tag::LowGtConf,
                self.min_gt_conf
            ));
        }
        if self.min_strand_ratio > 0.0 {
            records.push(format!(
                "##FILTER=<ID={},Description=\"A strand on the called allele has less than \
                 {:.2}% of the covg for that allele\">",
                Tag::StrandBias,
                self.min_strand_ratio * 100.0
            ));
        }
        if self.max_gaps > 0.0 {
            records.push(format!(
                "##FILTER=<ID={},Description=\"Fraction of kmers covering allele with \
                 coverage gaps is greater than {}\">",
                Tag::HighGaps,
                self.max_gaps
            ));
        }
        records
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_tag_values() {
        assert_eq!(Tag::FwdCovg.to_string(), "MEAN_FWD_COVG");
        assert_eq!(Tag::LowGtConf.to_string(), "lgc");
        assert_eq!(Tag::Pass.as_bytes(), b"PASS");
    }

    #[test]
    fn test_strand_ratio_is_weaker_share() {
        assert_relative_eq!(Strand::new(1, 3).ratio(), 0.25);
        assert_relative_eq!(Strand::new(3, 1).ratio(), 0.25);
        assert_relative_eq!(Strand::new(2, 2).ratio(), 0.5);
        assert_relative_eq!(Strand::new(0, 7).ratio(), 0.0);
    }

    #[test]
    fn test_strand_ratio_of_uncovered_allele_is_balanced() {
        assert_relative_eq!(Strand::new(0, 0).ratio(), 1.0);
    }

    #[test]
    fn test_status_renders_pass_when_nothing_failed() {
        let status = FilterStatus::default();
        assert!(status.is_pass());
        assert_eq!(status.to_string(), "PASS");
        assert!(status.failed().is_empty());
    }

    #[test]
    fn test_status_renders_failed_checks_in_reporting_order() {
        let status = FilterStatus {
            low_covg: true,
            strand_bias: true,
            high_gaps: true,
            ..FilterStatus::default()
        };
        assert!(!status.is_pass());
        assert_eq!(status.to_string(), "ld;sb;hg");
        assert_eq!(
            status.failed(),
            vec![Tag::LowCovg, Tag::StrandBias, Tag::HighGaps]
        );
    }

    #[test]
    fn test_status_orders_gt_conf_before_strand_bias() {
        let status = FilterStatus {
            high_covg: true,
            low_gt_conf: true,
            strand_bias: true,
            ..FilterStatus::default()
        };
        assert_eq!(status.to_string(), "hd;lgc;sb");
    }

    #[test]
    fn test_filter_rejects_contradictory_coverage_thresholds() {
        let err = Filter::new(10, 5, 0, 0.0, 0.0).unwrap_err();
        assert!(format!("{:?}", err).contains("minimum coverage (10) is more than"));
        // One of the two bounds unset is fine.
        assert!(Filter::new(10, 0, 0, 0.0, 0.0).is_ok());
        assert!(Filter::new(0, 5, 0, 0.0, 0.0).is_ok());
    }

    #[test]
    fn test_filter_rejects_strand_bias_above_fifty_percent() {
        let err = Filter::new(0, 0, 51, 0.0, 0.0).unwrap_err();
        assert!(format!("{:?}", err).contains("between 0 and 50"));
        assert!(Filter::new(0, 0, 50, 0.0, 0.0).is_ok());
    }

    #[test]
    fn test_header_records_cover_enabled_checks_only() {
        let filter = Filter::new(2, 0, 25, 5.0, 0.75).unwrap();
        let records = filter.header_records();
        assert_eq!(records.len(), 4);
        assert_eq!(
            records[0],
            "##FILTER=<ID=ld,Description=\"Kmer coverage on called allele less than 2\">"
        );
        assert!(records[1].contains("ID=lgc"));
        assert!(records[1].contains("less than 5"));
        assert!(records[2].contains("ID=sb"));
        assert!(records[2].contains("25.00% of the covg"));
        assert!(records[3].contains("ID=hg"));
        assert!(records[3].contains("greater than 0.75"));
    }

    #[test]
    fn test_disabled_filter_has_no_header_records() {
        let filter = Filter::new(0, 0, 0, 0.0, 0.0).unwrap();
        assert!(filter.header_records().is_empty());
    }
}
