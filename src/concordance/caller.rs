//! Streams two position-sorted call sets in lockstep and classifies every
//! aligned record pair. The two inputs must contain the same sites in the
//! same order; alignment (sorting, site intersection) is upstream's job.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use counter::Counter;
use derive_builder::Builder;
use progress_logger::ProgressLogger;
use rust_htslib::bcf::{self, Read};
use strum::IntoEnumIterator;

use crate::concordance::{Classifier, ClassifierBuilder, Outcome};
use crate::errors::Error;
use crate::mask::PositionMask;
use crate::utils;
use crate::variant::{Classification, VariantRecord};

/// One classified site in the tab-separated report.
#[derive(Debug, Serialize)]
struct SiteRow {
    chrom: String,
    pos: u64,
    truth: Classification,
    query: Classification,
    outcome: Outcome,
}

/// Aggregate outcome tallies and the derived benchmark metrics.
///
/// `assessed` excludes masked and filter-failed pairs, `called` additionally
/// excludes pairs where either side made no call. Het pairs count towards
/// neither the concordant nor the discordant bucket.
#[derive(Debug, Serialize)]
pub(crate) struct Summary {
    total: u64,
    assessed: u64,
    called: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    call_rate: Option<f64>,
    concordant: u64,
    discordant: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    concordance: Option<f64>,
    outcomes: BTreeMap<Outcome, u64>,
}

impl Summary {
    fn from_stats(stats: &Counter<Outcome>) -> Self {
        let count = |outcome: Outcome| stats.get(&outcome).copied().unwrap_or(0) as u64;

        let total: u64 = Outcome::iter().map(count).sum();
        let filter_failed = count(Outcome::BothFailFilter)
            + count(Outcome::AFailFilter)
            + count(Outcome::BFailFilter);
        let assessed = total - count(Outcome::Masked) - filter_failed;
        let called = assessed - count(Outcome::Null) - count(Outcome::FalseNull);
        let call_rate = if assessed == 0 {
            None
        } else {
            Some(called as f64 / assessed as f64)
        };

        let concordant = count(Outcome::TrueRef) + count(Outcome::TrueAlt);
        let discordant =
            count(Outcome::FalseRef) + count(Outcome::FalseAlt) + count(Outcome::DiffAlt);
        let concordance = if concordant + discordant == 0 {
            None
        } else {
            Some(concordant as f64 / (concordant + discordant) as f64)
        };

        Summary {
            total,
            assessed,
            called,
            call_rate,
            concordant,
            discordant,
            concordance,
            outcomes: Outcome::iter().map(|outcome| (outcome, count(outcome))).collect(),
        }
    }

    fn log(&self) {
        info!("CONCORDANCE SUMMARY");
        info!("===================");
        for (outcome, count) in &self.outcomes {
            info!("{}: {}", outcome, count);
        }
        match self.call_rate {
            Some(rate) => info!("call rate: {:.4} ({}/{})", rate, self.called, self.assessed),
            None => info!("call rate: undefined (no assessed site)"),
        }
        match self.concordance {
            Some(concordance) => info!(
                "concordance: {:.4} ({}/{})",
                concordance,
                self.concordant,
                self.concordant + self.discordant
            ),
            None => info!("concordance: undefined (no concordant or discordant site)"),
        }
    }
}

#[derive(Builder)]
#[builder(pattern = "owned")]
pub(crate) struct Caller {
    truth_path: PathBuf,
    query_path: PathBuf,
    #[builder(default)]
    mask: Option<PositionMask>,
    #[builder(default)]
    apply_filter: bool,
    output: PathBuf,
    #[builder(default)]
    summary_path: Option<PathBuf>,
}

impl Caller {
    pub(crate) fn call(&mut self) -> Result<()> {
        let mut truth_reader = bcf::Reader::from_path(&self.truth_path)
            .with_context(|| format!("failed to open {}", self.truth_path.display()))?;
        let mut query_reader = bcf::Reader::from_path(&self.query_path)
            .with_context(|| format!("failed to open {}", self.query_path.display()))?;

        let classifier: Classifier = ClassifierBuilder::default()
            .mask(self.mask.take())
            .apply_filter(self.apply_filter)
            .build()?;

        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(&self.output)
            .with_context(|| format!("failed to create {}", self.output.display()))?;

        let mut stats: Counter<Outcome> = Counter::new();
        let mut progress_logger = ProgressLogger::builder()
            .with_items_name("records")
            .with_frequency(Duration::from_secs(20))
            .start();

        loop {
            let mut truth_record = truth_reader.empty_record();
            let mut query_record = query_reader.empty_record();
            let truth_eof = match truth_reader.read(&mut truth_record) {
                None => true,
                Some(res) => {
                    res?;
                    false
                }
            };
            let query_eof = match query_reader.read(&mut query_record) {
                None => true,
                Some(res) => {
                    res?;
                    false
                }
            };

            match (truth_eof, query_eof) {
                (true, true) => break,
                (true, false) => {
                    return Err(Error::UnpairedRecord {
                        exhausted: "truth".to_owned(),
                    }
                    .into())
                }
                (false, true) => {
                    return Err(Error::UnpairedRecord {
                        exhausted: "query".to_owned(),
                    }
                    .into())
                }
                (false, false) => {}
            }

            let chrom = utils::chrom_name(&truth_record)?;
            let query_chrom = utils::chrom_name(&query_record)?;
            if chrom != query_chrom {
                return Err(Error::ContigMismatch {
                    a_chrom: chrom,
                    b_chrom: query_chrom,
                    pos: truth_record.position(),
                }
                .into());
            }

            let (truth, query, outcome) = classifier.classify(&truth_record, &query_record)?;
            csv_writer.serialize(SiteRow {
                chrom,
                pos: truth_record.position(),
                truth,
                query,
                outcome,
            })?;
            stats[&outcome] += 1;
            progress_logger.update(1u64);
        }
        progress_logger.stop();
        csv_writer.flush()?;

        let summary = Summary::from_stats(&stats);
        summary.log();
        if let Some(path) = &self.summary_path {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            serde_json::to_writer_pretty(file, &summary)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn stats_of(outcomes: &[(Outcome, usize)]) -> Counter<Outcome> {
        let mut stats = Counter::new();
        for (outcome, count) in outcomes {
            stats[outcome] += count;
        }
        stats
    }

    #[test]
    fn test_summary_metrics() {
        let stats = stats_of(&[
            (Outcome::Masked, 2),
            (Outcome::BFailFilter, 1),
            (Outcome::Null, 1),
            (Outcome::FalseNull, 1),
            (Outcome::TrueRef, 3),
            (Outcome::TrueAlt, 2),
            (Outcome::FalseAlt, 1),
            (Outcome::DiffAlt, 1),
            (Outcome::Het, 1),
        ]);

        let summary = Summary::from_stats(&stats);
        assert_eq!(summary.total, 13);
        assert_eq!(summary.assessed, 10);
        assert_eq!(summary.called, 8);
        assert_relative_eq!(summary.call_rate.unwrap(), 0.8);
        assert_eq!(summary.concordant, 5);
        assert_eq!(summary.discordant, 2);
        assert_relative_eq!(summary.concordance.unwrap(), 5.0 / 7.0);
    }

    #[test]
    fn test_summary_handles_empty_input() {
        let summary = Summary::from_stats(&Counter::new());
        assert_eq!(summary.total, 0);
        assert!(summary.call_rate.is_none());
        assert!(summary.concordance.is_none());
    }

    #[test]
    fn test_summary_handles_all_masked() {
        let summary = Summary::from_stats(&stats_of(&[(Outcome::Masked, 4)]));
        assert_eq!(summary.total, 4);
        assert_eq!(summary.assessed, 0);
        assert!(summary.call_rate.is_none());
        assert!(summary.concordance.is_none());
    }
}
