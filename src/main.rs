use clap::Parser;
use phylocnv::{
    cli::{init_verbose, Cli, Command, FULL_VERSION},
    commands::{coverage, extract, map, snps},
    utils::{handle_error_and_exit, Result},
};

fn runner() -> Result<()> {
    let cli = Cli::parse();
    init_verbose(&cli);
    let subcommand_name = match cli.command {
        Command::Map(_) => "map",
        Command::Cov(_) => "cov",
        Command::Extract(_) => "extract",
        Command::Snps(_) => "snps",
    };

    log::info!(
        "Running {}-{} [{}]",
        env!("CARGO_PKG_NAME"),
        *FULL_VERSION,
        subcommand_name
    );
    match cli.command {
        Command::Map(args) => map::map(args)?,
        Command::Cov(args) => coverage::coverage(args)?,
        Command::Extract(args) => extract::extract(args)?,
        Command::Snps(args) => snps::snps(args)?,
    }
    log::info!("{} end", env!("CARGO_PKG_NAME"));
    Ok(())
}

fn main() {
    if let Err(e) = runner() {
        handle_error_and_exit(e);
    }
}
