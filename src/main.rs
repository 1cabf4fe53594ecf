use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use locallog::cli::Cli;
use locallog::LoggerError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Diagnostics go to stderr so stdout stays scriptable
    let default_filter = if cli.verbose {
        "locallog=debug"
    } else {
        "locallog=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

fn report(error: &anyhow::Error) {
    for (depth, cause) in error.chain().enumerate() {
        let message = match cause.downcast_ref::<LoggerError>() {
            Some(e) => e.user_message(),
            None => cause.to_string(),
        };
        if depth == 0 {
            eprintln!("Error: {}", message);
        } else {
            eprintln!("  Caused by: {}", message);
        }
    }
}
