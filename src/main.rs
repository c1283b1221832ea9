use clap::Parser;
use workly::cli::commands::Cli;
use workly::cli::handlers;
use workly::io::logging;

fn main() {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
