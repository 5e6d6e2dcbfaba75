use crate::demo::{run_demo, run_search, DemoArgs, SearchArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use job_board::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Job Board",
    about = "Run the job board API or explore its search and application pipeline from the command line",
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
    /// Filter a CSV job catalog with the same criteria the search endpoint accepts
    Search(SearchArgs),
    /// Seed an in-memory board and walk one application through the status pipeline
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Search(args) => run_search(args),
        Command::Demo(args) => run_demo(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_serve_without_subcommand() {
        let cli = Cli::try_parse_from(["job-board-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn search_accepts_filter_flags() {
        let cli = Cli::try_parse_from([
            "job-board-api",
            "search",
            "--catalog",
            "jobs.csv",
            "--keyword",
            "designer",
            "--min-salary",
            "30000",
            "--date-post",
            "week",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Search(args)) => {
                assert_eq!(args.keyword.as_deref(), Some("designer"));
                assert_eq!(args.min_salary.as_deref(), Some("30000"));
                assert_eq!(args.date_post.as_deref(), Some("week"));
            }
            other => panic!("expected search command, got {other:?}"),
        }
    }
}
