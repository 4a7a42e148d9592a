use clap::Parser;
use nbtree::cli::commands::Cli;
use nbtree::cli::handlers;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "nbtree=warn",
        1 => "nbtree=info",
        _ => "nbtree=debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("NBT_LOG").unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
