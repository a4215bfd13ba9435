mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use jamf_core::Jss;

use crate::cli::{Cli, ColorMode, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);
    init_diagnostics(&cli.global.color);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

/// `-v` raises the level one step per flag; `RUST_LOG` wins when set.
fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{level},hyper=warn,reqwest=warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

// Error reports follow --color like the rest of the output.
fn init_diagnostics(color: &ColorMode) {
    let color = output::should_color(color);
    let _ = miette::set_hook(Box::new(move |_| {
        Box::new(miette::MietteHandlerOpts::new().color(color).build())
    }));
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Local only; no server involved.
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),
        Command::Completions(args) => {
            use clap::CommandFactory;

            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "jamf", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let connection = config::build_connection_config(&cli.global)?;
            let jss = Jss::new(&connection)?;
            tracing::debug!(
                server = %connection.url,
                timeout = ?connection.timeout,
                "connecting"
            );
            commands::dispatch(cmd, &jss, &cli.global).await
        }
    }
}
