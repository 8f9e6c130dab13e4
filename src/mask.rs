//! Positions excluded from confident comparison, e.g. low-confidence or
//! repetitive regions of the reference.

use std::collections::HashSet;
use std::iter::FromIterator;
use std::path::Path;

use anyhow::{Context, Result};
use bio::io::bed;

/// Set of 1-based positions covered by the mask intervals.
#[derive(Debug, Clone, Default)]
pub struct PositionMask {
    positions: HashSet<u64>,
}

impl PositionMask {
    /// Expand BED intervals (0-based, half-open) into 1-based positions.
    pub fn from_bed<P: AsRef<Path> + std::fmt::Debug>(path: P) -> Result<Self> {
        let mut bed_reader = bed::Reader::from_file(path).context("failed to open mask BED file")?;
        let mut positions = HashSet::new();
        for record in bed_reader.records() {
            let record = record.context("failed to parse mask BED record")?;
            positions.extend(record.start() + 1..=record.end());
        }
        let mask = PositionMask { positions };
        info!("{} position(s) masked", mask.len());
        Ok(mask)
    }

    pub fn contains(&self, position: u64) -> bool {
        self.positions.contains(&position)
    }

    pub(crate) fn len(&self) -> usize {
        self.positions.len()
    }
}

impl FromIterator<u64> for PositionMask {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        PositionMask {
            positions: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_mask_from_positions() {
        let mask: PositionMask = vec![2, 10, 11].into_iter().collect();
        assert!(mask.contains(2));
        assert!(mask.contains(10));
        assert!(!mask.contains(3));
        assert_eq!(mask.len(), 3);
    }

    #[test]
    fn test_mask_from_bed_expands_intervals() {
        let mut bed_file = NamedTempFile::new().unwrap();
        writeln!(bed_file, "chrom\t3\t6\tregion1").unwrap();
        writeln!(bed_file, "chrom\t10\t11").unwrap();
        bed_file.flush().unwrap();

        let mask = PositionMask::from_bed(bed_file.path()).unwrap();
        // interval [3, 6) covers 1-based positions 4..=6
        assert!(!mask.contains(3));
        assert!(mask.contains(4));
        assert!(mask.contains(5));
        assert!(mask.contains(6));
        assert!(!mask.contains(7));
        assert!(mask.contains(11));
        assert_eq!(mask.len(), 4);
    }

    #[test]
    fn test_empty_mask_contains_nothing() {
        let mask = PositionMask::default();
        assert!(!mask.contains(1));
    }
}
