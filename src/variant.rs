//! Record-level genotype model shared by the concordance and filtration
//! subcommands. The `VariantRecord` trait is the minimal surface the
//! classifier needs from a VCF record, so the decision logic stays
//! independent of the htslib types and tests can supply plain structs.

use std::fmt;

use anyhow::Result;
use itertools::Itertools;
use rust_htslib::bcf;

use crate::errors::Error;

pub(crate) const MISSING_ALLELE: i32 = -1;

/// Zygosity of a single call.
#[derive(
    Display,
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    EnumString,
    IntoStaticStr,
    PartialEq,
    Hash,
    Eq,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// No allele is called.
    Null,
    /// All called alleles equal the reference.
    Ref,
    /// Called alleles mix reference and alternate, or two different alternates.
    Het,
    /// All called alleles are the same alternate.
    Alt,
}

/// The per-sample allele index array of a call, padded to at least two
/// entries so haploid calls are evaluated with an implicit missing allele.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Genotype {
    alleles: Vec<i32>,
}

impl Genotype {
    pub fn new(mut alleles: Vec<i32>) -> Self {
        while alleles.len() < 2 {
            alleles.push(MISSING_ALLELE);
        }
        Genotype { alleles }
    }

    fn called(&self) -> impl Iterator<Item = i32> + '_ {
        self.alleles
            .iter()
            .copied()
            .filter(|allele| *allele != MISSING_ALLELE)
    }

    pub(crate) fn classification(&self) -> Classification {
        let mut called = self.called();
        let first = match called.next() {
            None => return Classification::Null,
            Some(allele) => allele,
        };
        if called.all(|allele| allele == first) {
            if first == 0 {
                Classification::Ref
            } else {
                Classification::Alt
            }
        } else {
            Classification::Het
        }
    }

    /// 0-based index into the ALT allele list for a hom-alt call.
    pub(crate) fn alt_index(&self) -> Option<usize> {
        match self.classification() {
            Classification::Alt => {
                let allele = self.called().max().expect("bug: alt call without alleles");
                Some(allele as usize - 1)
            }
            _ => None,
        }
    }

    /// Index of the called allele within per-allele FORMAT metrics (REF is
    /// at 0). Null calls use the reference metrics.
    pub(crate) fn allele_index(&self) -> Result<usize> {
        match self.classification() {
            Classification::Null | Classification::Ref => Ok(0),
            Classification::Alt => Ok(self.alt_index().map(|index| index + 1).unwrap_or(0)),
            Classification::Het => Err(Error::UnexpectedHetGenotype {
                genotype: self.to_string(),
            }
            .into()),
        }
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let formatted = self
            .alleles
            .iter()
            .map(|allele| {
                if *allele == MISSING_ALLELE {
                    ".".to_owned()
                } else {
                    allele.to_string()
                }
            })
            .join("/");
        write!(f, "{}", formatted)
    }
}

/// What the concordance classifier needs to know about a record.
pub trait VariantRecord {
    /// 1-based genomic position.
    fn position(&self) -> u64;

    /// Genotype of the first sample.
    fn genotype(&self) -> Result<Genotype>;

    /// ALT allele sequences, in the order the record lists them.
    fn alt_alleles(&self) -> Vec<Vec<u8>>;

    /// Raw FILTER text; `None` when the column is unset.
    fn filter_text(&self) -> Option<String>;
}

impl VariantRecord for bcf::Record {
    fn position(&self) -> u64 {
        self.pos() as u64 + 1
    }

    fn genotype(&self) -> Result<Genotype> {
        if self.sample_count() == 0 {
            return Err(Error::MissingGenotypes.into());
        }
        let genotypes = self.genotypes()?;
        let alleles = genotypes
            .get(0)
            .iter()
            .map(|allele| match allele.index() {
                Some(index) => index as i32,
                None => MISSING_ALLELE,
            })
            .collect();
        Ok(Genotype::new(alleles))
    }

    fn alt_alleles(&self) -> Vec<Vec<u8>> {
        self.alleles()
            .iter()
            .skip(1)
            .map(|allele| allele.to_vec())
            .collect()
    }

    fn filter_text(&self) -> Option<String> {
        let names: Vec<String> = self
            .filters()
            .map(|id| String::from_utf8_lossy(&self.header().id_to_name(id)).into_owned())
            .collect();
        if names.is_empty() {
            None
        } else {
            Some(names.iter().join(";"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classification_of(alleles: Vec<i32>) -> Classification {
        Genotype::new(alleles).classification()
    }

    #[test]
    fn test_all_missing_is_null() {
        assert_eq!(classification_of(vec![-1]), Classification::Null);
        assert_eq!(classification_of(vec![-1, -1]), Classification::Null);
        assert_eq!(classification_of(vec![-1, -1, -1]), Classification::Null);
        assert_eq!(classification_of(vec![]), Classification::Null);
    }

    #[test]
    fn test_all_reference_is_ref() {
        assert_eq!(classification_of(vec![0, 0]), Classification::Ref);
        assert_eq!(classification_of(vec![0]), Classification::Ref);
        assert_eq!(classification_of(vec![0, -1]), Classification::Ref);
    }

    #[test]
    fn test_single_alternate_is_alt() {
        assert_eq!(classification_of(vec![1, 1]), Classification::Alt);
        assert_eq!(classification_of(vec![3]), Classification::Alt);
        assert_eq!(classification_of(vec![2, -1]), Classification::Alt);
    }

    #[test]
    fn test_mixed_alleles_are_het() {
        assert_eq!(classification_of(vec![1, 0]), Classification::Het);
        assert_eq!(classification_of(vec![0, 1]), Classification::Het);
        assert_eq!(classification_of(vec![1, 2]), Classification::Het);
        assert_eq!(classification_of(vec![0, 0, 1]), Classification::Het);
    }

    #[test]
    fn test_alt_index_is_zero_based() {
        assert_eq!(Genotype::new(vec![3]).alt_index(), Some(2));
        assert_eq!(Genotype::new(vec![1, 1]).alt_index(), Some(0));
        assert_eq!(Genotype::new(vec![0, 0]).alt_index(), None);
        assert_eq!(Genotype::new(vec![0, 1]).alt_index(), None);
        assert_eq!(Genotype::new(vec![-1]).alt_index(), None);
    }

    #[test]
    fn test_allele_index_uses_reference_for_null() {
        assert_eq!(Genotype::new(vec![-1, -1]).allele_index().unwrap(), 0);
        assert_eq!(Genotype::new(vec![0, 0]).allele_index().unwrap(), 0);
        assert_eq!(Genotype::new(vec![2, 2]).allele_index().unwrap(), 2);
    }

    #[test]
    fn test_allele_index_rejects_het() {
        let err = Genotype::new(vec![0, 1]).allele_index().unwrap_err();
        assert!(format!("{:?}", err).contains("heterozygous genotype 0/1"));
    }

    #[test]
    fn test_genotype_display() {
        assert_eq!(Genotype::new(vec![0, 1]).to_string(), "0/1");
        assert_eq!(Genotype::new(vec![-1]).to_string(), "./.");
        assert_eq!(Genotype::new(vec![2]).to_string(), "2/.");
    }
}
