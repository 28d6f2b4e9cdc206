//! certiam - console for the certificate and IAM administration backend.
//!
//! Every backend call goes through the same request pipeline the embedded
//! app uses: failures are printed to stderr and a 401/403 clears the
//! persisted session.

mod commands;
mod console;
mod output;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{
    certs::CertsCommand, download::DownloadArgs, groups::GroupsCommand, perms::PermsCommand, roles::RolesCommand,
    routes::RoutesArgs, session::SessionCommand, users::UsersCommand,
};
use console::Console;

#[derive(Parser)]
#[command(name = "certiam", version, about = "Certificate and IAM administration console")]
struct Cli {
    /// Backend base URL (overrides the config file).
    #[arg(long, global = true, env = "CERTIAM_BASE_URL")]
    base_url: Option<String>,

    /// Bearer token to use instead of the stored session.
    #[arg(long, global = true, env = "CERTIAM_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Print JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    /// Also write logs to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Certificate management.
    #[command(subcommand)]
    Certs(CertsCommand),

    /// Permission groups.
    #[command(subcommand)]
    Perms(PermsCommand),

    /// Roles.
    #[command(subcommand)]
    Roles(RolesCommand),

    /// Users and sub-accounts.
    #[command(subcommand)]
    Users(UsersCommand),

    /// User groups.
    #[command(subcommand)]
    Groups(GroupsCommand),

    /// Stored session.
    #[command(subcommand)]
    Session(SessionCommand),

    /// Show the routes and menu a permission set produces.
    Routes(RoutesArgs),

    /// Fetch a binary resource as-is.
    Download(DownloadArgs),
}

/// Initialize the tracing subscriber for logging
fn init_tracing(log_file: Option<&PathBuf>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
            let name = path.file_name().map(|n| n.to_os_string()).unwrap_or_else(|| "certiam.log".into());
            let appender = tracing_appender::rolling::never(dir.unwrap_or_else(|| std::path::Path::new(".")), name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_file.as_ref());
    info!("certiam starting");

    let console = Console::open(cli.base_url.as_deref(), cli.token.as_deref(), cli.json)?;

    match cli.command {
        Command::Certs(cmd) => cmd.run(&console).await,
        Command::Perms(cmd) => cmd.run(&console).await,
        Command::Roles(cmd) => cmd.run(&console).await,
        Command::Users(cmd) => cmd.run(&console).await,
        Command::Groups(cmd) => cmd.run(&console).await,
        Command::Session(cmd) => cmd.run(&console),
        Command::Routes(args) => args.run(&console),
        Command::Download(args) => args.run(&console).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "certiam",
            "certs",
            "list",
            "--tag",
            "prod",
            "--json",
            "--base-url",
            "http://api.test",
        ])
        .expect("arguments should parse");
        assert!(cli.json);
        assert_eq!(cli.base_url.as_deref(), Some("http://api.test"));
        assert!(matches!(cli.command, Command::Certs(CertsCommand::List(_))));
    }

    #[test]
    fn test_cli_parses_download() {
        let cli = Cli::try_parse_from([
            "certiam",
            "download",
            "/apis/v1/certs/7/bundle",
            "--param",
            "format=pem",
            "-o",
            "bundle.pem",
        ])
        .expect("arguments should parse");
        let Command::Download(args) = cli.command else {
            panic!("expected download");
        };
        assert_eq!(args.path, "/apis/v1/certs/7/bundle");
        assert_eq!(args.params, vec![("format".to_string(), "pem".to_string())]);
        assert_eq!(args.output, Some(PathBuf::from("bundle.pem")));
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
