pub(crate) mod advise;
pub(crate) mod error;
pub(crate) mod log_args;
pub(crate) mod root;

use advise::{advise, AdviseArgs};
use colored::Colorize;
use error::Error;
use evmstate_common::utils::hex::ToLowerHex;
use log_args::LogArgs;
use root::{root, RootArgs};
use tracing::debug;

use clap::{Parser, Subcommand};

use evmstate_config::{config, ConfigArgs, Configuration};

#[derive(Debug, Parser)]
#[clap(name = "evmstate", version)]
pub(crate) struct Arguments {
    #[clap(subcommand)]
    pub(crate) sub: Subcommands,

    #[clap(flatten)]
    logs: LogArgs,
}

#[derive(Debug, Subcommand)]
#[clap(
    about = "evmstate computes state roots and memory growth for an EVM-style execution state."
)]
pub(crate) enum Subcommands {
    #[clap(name = "root", about = "Compute the state root of a JSON account allocation")]
    Root(RootArgs),

    #[clap(
        name = "advise",
        about = "Show how much memory an instruction would grow to, and what the growth costs"
    )]
    Advise(AdviseArgs),

    #[clap(name = "config", about = "Display and edit the current configuration")]
    Config(ConfigArgs),
}

fn main() -> Result<(), Error> {
    let args = Arguments::parse();

    // setup logging, keeping the file writer alive until we exit
    let _guard = args.logs.init_tracing().ok().flatten();

    let configuration = Configuration::load()?;
    debug!("loaded configuration: {:?}", configuration);

    match args.sub {
        Subcommands::Root(cmd) => {
            let root = root(&cmd, &configuration)?;
            println!("{}", root.to_lower_hex().green());
        }

        Subcommands::Advise(cmd) => {
            let advice = advise(&cmd, &configuration)?;
            println!(
                "{} grows memory to {} bytes ({} gas)",
                advice.mnemonic.bold(),
                advice.length.to_string().green(),
                advice.expansion_cost.to_string().yellow()
            );
        }

        Subcommands::Config(cmd) => {
            config(cmd)?;
        }
    }

    Ok(())
}
