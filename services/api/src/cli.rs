use crate::screen::{run_screen, ScreenArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use watchlist::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "watchlist-api",
    about = "Screen names and addresses against sanctions and denied-party lists",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run a single screening query against a list directory and print JSON
    Screen(ScreenArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override WATCHLIST_DATA_DIR
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Screen(args) => tokio::task::spawn_blocking(move || run_screen(args))
            .await?,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["watchlist-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn screen_accepts_query_flags() {
        let cli = Cli::try_parse_from([
            "watchlist-api",
            "screen",
            "--data-dir",
            "/srv/lists",
            "--name",
            "midco",
            "--country",
            "United Kingdom",
            "--limit",
            "5",
            "--min-match",
            "0.8",
            "--entities",
        ])
        .expect("parses");

        let Some(Command::Screen(args)) = cli.command else {
            panic!("expected screen command");
        };
        assert_eq!(args.data_dir, PathBuf::from("/srv/lists"));
        assert_eq!(args.name.as_deref(), Some("midco"));
        assert_eq!(args.country.as_deref(), Some("United Kingdom"));
        assert_eq!(args.limit, Some(5));
        assert_eq!(args.min_match, Some(0.8));
        assert!(args.entities);
    }

    #[test]
    fn screen_requires_a_data_dir() {
        assert!(Cli::try_parse_from(["watchlist-api", "screen", "--name", "midco"]).is_err());
    }
}
