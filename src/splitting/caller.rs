//! Cuts a reference FASTA into one file per locus, guided by a GFF3
//! annotation, and writes a table mapping every produced file to its
//! coordinates.

use std::cmp;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bio::io::{fasta, gff};
use derive_builder::Builder;

use crate::errors::Error;
use crate::splitting::{feature_name, ContigFeatures, Locus};

#[derive(Display, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
enum LocusType {
    Feature,
    Igr,
}

impl LocusType {
    fn subdir(self) -> &'static str {
        match self {
            LocusType::Feature => "features",
            LocusType::Igr => "igrs",
        }
    }
}

/// One row in the locus table.
#[derive(Debug, Serialize)]
struct LocusRow {
    filename: String,
    #[serde(rename = "type")]
    locus_type: LocusType,
    start: u64,
    end: u64,
    name: String,
    contig: String,
}

struct Contig {
    name: String,
    seq: Vec<u8>,
}

impl Contig {
    /// Bases of a half-open 1-based interval, clamped to the sequence.
    fn slice(&self, locus: &Locus) -> &[u8] {
        let end = cmp::min(locus.end().saturating_sub(1) as usize, self.seq.len());
        let start = cmp::min(locus.start().saturating_sub(1) as usize, end);
        &self.seq[start..end]
    }
}

#[derive(Builder)]
#[builder(pattern = "owned")]
pub(crate) struct Caller {
    #[builder(default)]
    fasta: Option<PathBuf>,
    gff: PathBuf,
    outdir: PathBuf,
    types: Vec<String>,
    #[builder(default)]
    min_igr_len: u64,
    #[builder(default)]
    max_igr_len: Option<u64>,
    #[builder(default)]
    no_merge: bool,
}

impl Caller {
    pub(crate) fn call(&mut self) -> Result<()> {
        let igr_disabled = self.max_igr_len == Some(0);

        info!("indexing reference sequences...");
        let contigs = self.index_fasta()?;
        info!("{} contig(s) indexed from the input", contigs.len());

        info!("collecting features from the annotation...");
        let mut features = self.read_features()?;
        for contig in features.keys() {
            if !contigs.iter().any(|known| &known.name == contig) {
                return Err(Error::UnknownContig {
                    contig: contig.clone(),
                }
                .into());
            }
        }

        fs::create_dir_all(&self.outdir)
            .with_context(|| format!("failed to create {}", self.outdir.display()))?;
        let table_path = self.outdir.join("loci-info.csv");
        let mut table = csv::Writer::from_path(&table_path)
            .with_context(|| format!("failed to create {}", table_path.display()))?;

        let mut contig_features = Vec::with_capacity(contigs.len());
        for contig in &contigs {
            let loci = features.remove(&contig.name).unwrap_or_default();
            let loci = ContigFeatures::new(loci, !self.no_merge);
            info!("found {} feature(s) for {}", loci.len(), contig.name);
            contig_features.push(loci);
        }

        // all feature rows precede all IGR rows in the locus table
        for (contig, loci) in contigs.iter().zip(&contig_features) {
            for locus in loci.iter() {
                self.write_locus(contig, locus, LocusType::Feature, &mut table)?;
            }
        }

        if !igr_disabled {
            for (contig, loci) in contigs.iter().zip(&contig_features) {
                for (start, end) in loci.complement(contig.seq.len() as u64) {
                    let len = end - start;
                    if len < self.min_igr_len || self.max_igr_len.map_or(false, |max| len > max) {
                        debug!(
                            "skipping {}:{}-{}, outside the requested length range",
                            contig.name, start, end
                        );
                        continue;
                    }
                    let igr = Locus::new(loci.igr_name(start, end)?, start, end);
                    self.write_locus(contig, &igr, LocusType::Igr, &mut table)?;
                }
            }
        }
        table.flush()?;
        info!("locus table written to {}", table_path.display());
        Ok(())
    }

    fn index_fasta(&self) -> Result<Vec<Contig>> {
        let input: Box<dyn io::Read> = match &self.fasta {
            Some(path) => Box::new(
                fs::File::open(path)
                    .with_context(|| format!("failed to open {}", path.display()))?,
            ),
            None => Box::new(io::stdin()),
        };
        let reader = fasta::Reader::new(input);

        let mut contigs: Vec<Contig> = Vec::new();
        for result in reader.records() {
            let record = result.context("failed to parse the reference FASTA")?;
            if contigs.iter().any(|contig| contig.name == record.id()) {
                return Err(Error::DuplicateContig {
                    contig: record.id().to_owned(),
                }
                .into());
            }
            contigs.push(Contig {
                name: record.id().to_owned(),
                seq: record.seq().to_owned(),
            });
        }
        Ok(contigs)
    }

    fn read_features(&self) -> Result<HashMap<String, Vec<Locus>>> {
        let mut reader = gff::Reader::from_file(&self.gff, gff::GffType::GFF3)
            .with_context(|| format!("failed to open {}", self.gff.display()))?;

        let mut features: HashMap<String, Vec<Locus>> = HashMap::new();
        for result in reader.records() {
            let record = result.context("failed to parse the annotation GFF3")?;
            if !self.types.iter().any(|ty| ty == record.feature_type()) {
                continue;
            }
            let locus = Locus::new(feature_name(&record), *record.start(), *record.end());
            features
                .entry(record.seqname().to_owned())
                .or_default()
                .push(locus);
        }
        Ok(features)
    }

    fn write_locus(
        &self,
        contig: &Contig,
        locus: &Locus,
        locus_type: LocusType,
        table: &mut csv::Writer<fs::File>,
    ) -> Result<()> {
        let dir = self.outdir.join(&contig.name).join(locus_type.subdir());
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let filename = format!("{}.fa", locus.name());
        let path = dir.join(&filename);
        if path.exists() {
            return Err(Error::OutputFileExists { path }.into());
        }

        // IGR headers carry the file name as their id, feature headers the
        // bare locus name.
        let id = match locus_type {
            LocusType::Feature => locus.name().as_str(),
            LocusType::Igr => filename.as_str(),
        };
        let desc = format!(
            "contig={}|start={}|end={}",
            contig.name,
            locus.start(),
            locus.end()
        );
        let mut writer = fasta::Writer::to_file(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        writer.write(id, Some(desc.as_str()), contig.slice(locus))?;

        table.serialize(LocusRow {
            filename: format!("{}/{}/{}", contig.name, locus_type.subdir(), filename),
            locus_type,
            start: locus.start(),
            end: locus.end(),
            name: locus.name().clone(),
            contig: contig.name.clone(),
        })?;
        debug!(
            "{}:{}-{} ({} bp) written to {}",
            contig.name,
            locus.start(),
            locus.end(),
            locus.len(),
            path.display()
        );
        Ok(())
    }
}
