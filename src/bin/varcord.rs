use anyhow::Result;
use structopt::StructOpt;

use varcord::cli::{self, Varcord};

pub fn main() -> Result<()> {
    let opt = Varcord::from_args();
    cli::setup_logging(opt.verbose)?;
    cli::run(opt)
}
