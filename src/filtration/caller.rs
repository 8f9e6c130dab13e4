//! Streams one call set, rewrites every record's FILTER column from the
//! configured thresholds and reports per-filter tallies at the end.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use counter::Counter;
use derive_builder::Builder;
use progress_logger::ProgressLogger;
use rust_htslib::bcf::{self, Read};

use crate::concordance::fails_filter;
use crate::filtration::{Filter, Tag};
use crate::utils;
use crate::variant::VariantRecord;

#[derive(Builder)]
#[builder(pattern = "owned")]
pub(crate) struct Caller {
    #[builder(default)]
    input: Option<PathBuf>,
    #[builder(default)]
    output: Option<PathBuf>,
    filter: Filter,
    /// Replace a failing FILTER column instead of appending to it.
    #[builder(default = "true")]
    overwrite: bool,
}

impl Caller {
    pub(crate) fn call(&mut self) -> Result<()> {
        let mut reader = utils::vcf_reader(self.input.as_ref())?;

        let mut header = bcf::Header::from_template(reader.header());
        for record in self.filter.header_records() {
            debug!("adding header record: {}", record);
            header.push_record(record.as_bytes());
        }
        let mut writer = utils::vcf_writer(self.output.as_ref(), &header)?;

        info!("filtering records...");
        let mut stats: Counter<Tag> = Counter::new();
        let mut progress_logger = ProgressLogger::builder()
            .with_items_name("records")
            .with_frequency(Duration::from_secs(20))
            .start();

        loop {
            let mut record = reader.empty_record();
            match reader.read(&mut record) {
                None => break,
                Some(res) => res?,
            }
            writer.translate(&mut record);

            let status = self.filter.status(&record)?;
            let failed = status.failed();

            let append = !self.overwrite
                && fails_filter(record.filter_text().as_deref())
                && !failed.is_empty();
            if append {
                for tag in &failed {
                    record.push_filter(tag.as_bytes())?;
                }
            } else {
                let names: Vec<&[u8]> = if failed.is_empty() {
                    vec![Tag::Pass.as_bytes()]
                } else {
                    failed.iter().map(|tag| tag.as_bytes()).collect()
                };
                record.set_filters(&names)?;
            }
            writer.write(&record)?;

            if status.is_pass() {
                stats[&Tag::Pass] += 1;
            } else {
                for tag in &failed {
                    stats[tag] += 1;
                }
            }
            progress_logger.update(1u64);
        }
        progress_logger.stop();

        info!("FILTER STATISTICS");
        info!("=================");
        for (tag, count) in stats.most_common_ordered() {
            info!("{}: {}", tag, count);
        }
        Ok(())
    }
}
