//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use locus_cli::CliError;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    match locus_cli::run() {
        Ok(()) => {}
        // Clap owns help, version and usage output along with their exit codes.
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            eprintln!("locus: {err}");
            std::process::exit(1);
        }
    }
}
