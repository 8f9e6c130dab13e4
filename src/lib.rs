//! Genotype concordance classification between a truth and a query call set,
//! threshold-based FILTER tagging, and reference splitting into loci.

#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate strum_macros;

pub mod cli;
pub mod concordance;
pub(crate) mod errors;
pub mod filtration;
pub mod mask;
pub mod splitting;
pub mod utils;
pub mod variant;
