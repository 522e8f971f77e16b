//! uplift-choose
//!
//! Rewrites the model settings file so the server loads either the solo
//! model (`default`) or the two-model artifact (`alt`).

use clap::error::ErrorKind;
use clap::Parser;
use tracing::error;

use uplift_core::{select_by_name, Error};
use uplift_tools::{init_logging, ChooseCli, CHOOSE_USAGE};

fn usage_error() -> ! {
    eprintln!("{}", CHOOSE_USAGE);
    std::process::exit(-1);
}

fn main() -> anyhow::Result<()> {
    let cli = match ChooseCli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(_) => usage_error(),
    };

    init_logging(cli.verbose);

    match select_by_name(&cli.choice, &cli.settings) {
        Ok(outcome) => {
            println!(
                "Model settings updated successfully in {}.",
                outcome.path.display()
            );
            Ok(())
        }
        Err(Error::InvalidArgument(msg)) => {
            error!("{}", msg);
            usage_error()
        }
        Err(e) => Err(e.into()),
    }
}
