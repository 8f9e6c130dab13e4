//! Splits a reference into loci: the annotated features of selected types
//! and the intergenic regions (IGRs) between them.
//!
//! Intervals are half-open over 1-based coordinates, taken verbatim from
//! the GFF3 columns. Overlapping features can be merged into a single
//! locus whose name joins the member names; features that merely touch
//! stay separate.

pub(crate) mod caller;

use std::cmp;

use anyhow::Result;
use bio::io::gff;
use derive_new::new;
use getset::{CopyGetters, Getters};

use crate::errors::Error;

/// One named half-open interval on a contig.
#[derive(new, Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct Locus {
    #[getset(get = "pub")]
    name: String,
    #[getset(get_copy = "pub")]
    start: u64,
    #[getset(get_copy = "pub")]
    end: u64,
}

impl Locus {
    pub(crate) fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    fn contains(&self, pos: u64) -> bool {
        self.start <= pos && pos < self.end
    }

    /// Extend this locus over one that starts within it, joining names.
    fn absorb(&mut self, other: Locus) {
        self.name = format!("{}+{}", self.name, other.name);
        self.end = cmp::max(self.end, other.end);
    }
}

/// Display name for a feature: its `Name` attribute, falling back to `ID`
/// and then to a positional description.
pub(crate) fn feature_name(record: &gff::Record) -> String {
    if let Some(name) = record.attributes().get("Name") {
        return name.clone();
    }
    if let Some(id) = record.attributes().get("ID") {
        return id.clone();
    }
    let name = format!(
        "{};{}-{}",
        record.feature_type(),
        record.start(),
        record.end()
    );
    warn!(
        "feature at {}:{}-{} has no Name or ID attribute, using {}",
        record.seqname(),
        record.start(),
        record.end(),
        name
    );
    name
}

/// The features of one contig, sorted by position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ContigFeatures {
    loci: Vec<Locus>,
}

impl ContigFeatures {
    pub(crate) fn new(mut loci: Vec<Locus>, merge: bool) -> Self {
        loci.sort_by(|a, b| (a.start(), a.end(), a.name()).cmp(&(b.start(), b.end(), b.name())));
        if !merge {
            return ContigFeatures { loci };
        }

        let mut merged: Vec<Locus> = Vec::with_capacity(loci.len());
        for locus in loci {
            match merged.last_mut() {
                Some(last) if locus.start() < last.end() => last.absorb(locus),
                _ => merged.push(locus),
            }
        }
        ContigFeatures { loci: merged }
    }

    pub(crate) fn len(&self) -> usize {
        self.loci.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Locus> {
        self.loci.iter()
    }

    /// The gaps of the contig span `[1, contig_len)` not covered by any
    /// feature.
    pub(crate) fn complement(&self, contig_len: u64) -> Vec<(u64, u64)> {
        let mut gaps = Vec::new();
        let mut cursor = 1;
        for locus in &self.loci {
            if locus.start() > cursor && cursor < contig_len {
                gaps.push((cursor, cmp::min(locus.start(), contig_len)));
            }
            cursor = cmp::max(cursor, locus.end());
        }
        if cursor < contig_len {
            gaps.push((cursor, contig_len));
        }
        gaps
    }

    /// Name an intergenic gap after its flanking features, `NA` where the
    /// gap has none.
    pub(crate) fn igr_name(&self, start: u64, end: u64) -> Result<String> {
        let left = self
            .neighbour(start.saturating_sub(1), "left", start, end)?
            .unwrap_or("NA");
        let right = self.neighbour(end + 1, "right", start, end)?.unwrap_or("NA");
        Ok(format!("{}+IGR:{}-{}+{}", left, start, end, right))
    }

    /// Name of the single feature containing `pos`, if any.
    fn neighbour(
        &self,
        pos: u64,
        side: &'static str,
        start: u64,
        end: u64,
    ) -> Result<Option<&str>> {
        let matches: Vec<&Locus> = self
            .loci
            .iter()
            .filter(|locus| locus.contains(pos))
            .collect();
        match matches.len() {
            0 => Ok(None),
            1 => Ok(Some(matches[0].name().as_str())),
            count => Err(Error::AmbiguousNeighbour {
                side,
                start,
                end,
                count,
            }
            .into()),
        }
    }
}
