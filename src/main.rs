use clap::error::ErrorKind;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use weighttp::cli::Cli;
use weighttp::config::Config;
use weighttp::coordinator;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    coordinator::print_banner();

    let cli = match Cli::try_parse_args() {
        Ok(cli) => cli,
        // --help / --version are not setup errors.
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            print!("{err}");
            return ExitCode::SUCCESS;
        }
        // Any other parse failure is an argument error: spec.md §6's exit
        // code 1, not clap's own default usage-error code (2, which this
        // tool reserves for thread-spawn failure).
        Err(err) => {
            eprint!("{err}");
            return ExitCode::from(1);
        }
    };

    let config = match Config::build(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("weighttp: {err}");
            return ExitCode::from(err.exit_code() as u8);
        }
    };

    match coordinator::run(config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("weighttp: {err}");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}
