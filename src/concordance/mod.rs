//! Pairwise genotype concordance between a truth call set (A) and a query
//! call set (B). The classifier receives two records for the same position
//! and reduces them to the zygosity of each call plus a single outcome
//! describing their agreement.
//!
//! Outcome precedence: masking and filter failure are diagnostic overrides
//! that short-circuit genotype comparison; null handling favours A as
//! ground truth; a het call on either side cannot be scored as true or
//! false, so it dominates the ref/alt distinctions.

pub(crate) mod caller;

use anyhow::Result;
use derive_builder::Builder;

use crate::errors::Error;
use crate::mask::PositionMask;
use crate::variant::{Classification, Genotype, VariantRecord};

/// Agreement between a truth and a query call at one position.
#[derive(
    Display,
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    IntoStaticStr,
    PartialEq,
    PartialOrd,
    Ord,
    Hash,
    Eq,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Masked,
    BothFailFilter,
    AFailFilter,
    BFailFilter,
    Null,
    FalseNull,
    TrueRef,
    FalseRef,
    FalseAlt,
    TrueAlt,
    DiffAlt,
    Het,
}

/// A record passes unless its FILTER text names at least one failed filter.
/// The literal `PASS` token and an unset column both pass.
pub(crate) fn fails_filter(raw: Option<&str>) -> bool {
    match raw {
        None => false,
        Some(text) => !(text.is_empty() || text == "PASS"),
    }
}

#[derive(Builder, Default)]
#[builder(pattern = "owned")]
pub struct Classifier {
    #[builder(default)]
    mask: Option<PositionMask>,
    #[builder(default)]
    apply_filter: bool,
}

impl Classifier {
    /// Classify both records and derive the outcome for their shared
    /// position. Both inputs must denote the same site; a position mismatch
    /// is a caller contract violation, not a data condition.
    pub fn classify<A: VariantRecord, B: VariantRecord>(
        &self,
        a: &A,
        b: &B,
    ) -> Result<(Classification, Classification, Outcome)> {
        let pos = a.position();
        if pos != b.position() {
            return Err(Error::PositionMismatch {
                a_pos: pos,
                b_pos: b.position(),
            }
            .into());
        }

        let a_genotype = a.genotype()?;
        let b_genotype = b.genotype()?;
        let a_class = a_genotype.classification();
        let b_class = b_genotype.classification();

        if let Some(mask) = &self.mask {
            if mask.contains(pos) {
                return Ok((a_class, b_class, Outcome::Masked));
            }
        }

        if self.apply_filter {
            let a_fails = fails_filter(a.filter_text().as_deref());
            let b_fails = fails_filter(b.filter_text().as_deref());
            match (a_fails, b_fails) {
                (true, true) => return Ok((a_class, b_class, Outcome::BothFailFilter)),
                (true, false) => return Ok((a_class, b_class, Outcome::AFailFilter)),
                (false, true) => return Ok((a_class, b_class, Outcome::BFailFilter)),
                (false, false) => {}
            }
        }

        let outcome = match (a_class, b_class) {
            (Classification::Null, _) => Outcome::Null,
            (_, Classification::Null) => Outcome::FalseNull,
            (Classification::Het, _) | (_, Classification::Het) => Outcome::Het,
            (Classification::Ref, Classification::Ref) => Outcome::TrueRef,
            (Classification::Alt, Classification::Ref) => Outcome::FalseRef,
            (Classification::Ref, Classification::Alt) => Outcome::FalseAlt,
            (Classification::Alt, Classification::Alt) => {
                if called_alt(a, &a_genotype, pos)? == called_alt(b, &b_genotype, pos)? {
                    Outcome::TrueAlt
                } else {
                    Outcome::DiffAlt
                }
            }
        };
        Ok((a_class, b_class, outcome))
    }
}

/// The ALT sequence a hom-alt genotype calls. An allele value beyond the
/// record's ALT list indicates an upstream data inconsistency and is
/// surfaced, never defaulted.
fn called_alt<R: VariantRecord>(record: &R, genotype: &Genotype, pos: u64) -> Result<Vec<u8>> {
    let index = genotype
        .alt_index()
        .expect("bug: called_alt requires an alt classification");
    let alts = record.alt_alleles();
    if index >= alts.len() {
        return Err(Error::AltAlleleOutOfBounds {
            pos,
            index,
            available: alts.len(),
        }
        .into());
    }
    Ok(alts[index].clone())
}
