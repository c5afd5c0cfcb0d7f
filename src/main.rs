//! CRM storage admin entry point.

use clap::Parser;
use crm::cli::commands;
use crm::cli::{Cli, Commands};
use crm::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                eprintln!("{}", e.to_structured_json());
            } else if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug,rusqlite=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli) -> Result<(), Error> {
    let data_dir = cli.data_dir.as_deref();
    let json = cli.json;

    match &cli.command {
        Commands::Init { force } => commands::init::execute(data_dir, *force, json),

        // Inspection
        Commands::Stats => commands::inspect::stats(data_dir, json),
        Commands::Report => commands::inspect::report(data_dir, json),
        Commands::Schema => commands::inspect::schema(data_dir, json),
        Commands::Sample { table, limit } => {
            commands::inspect::sample(data_dir, (*table).into(), *limit, json)
        }
        Commands::Check => commands::inspect::check(data_dir, json),
        Commands::Vacuum => commands::inspect::vacuum(data_dir, json),

        Commands::Migrate { command } => commands::migrate::execute(command, data_dir, json),

        // Transfer
        Commands::Export { output } => commands::transfer::export(data_dir, output.as_deref(), json),
        Commands::Import { file } => commands::transfer::import(data_dir, file, json),
        Commands::Reset { yes } => commands::transfer::reset(data_dir, *yes, json),
    }
}
