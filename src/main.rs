use clap::Parser;
use env_logger::Env;
use log::debug;

mod args;
mod rank;

fn main() {
    let args = args::Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();
    debug!("args: {:?}", args);

    if let Err(e) = rank::run_ranking(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
