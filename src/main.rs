use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, CommandFactory, Parser, Subcommand};
use fundcmp::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct CompareCommand {
    /// First fund, by commercial name or tax id
    fund_a: String,
    /// Second fund, by commercial name or tax id
    fund_b: String,
    /// Start of the analysis range (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    start: Option<NaiveDate>,
    /// End of the analysis range (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    end: Option<NaiveDate>,
    /// Amount to simulate
    #[arg(short, long)]
    amount: Option<f64>,
    /// Application date, defaults to the start of the common period
    #[arg(long, value_parser = parse_date)]
    application_date: Option<NaiveDate>,
    /// Maximum rows in the cumulative return table
    #[arg(long, default_value_t = fundcmp::DEFAULT_POINTS)]
    points: usize,
    /// Print the comparison as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// List selectable funds
    Funds {
        /// Case-insensitive filter on name or tax id
        filter: Option<String>,
    },
    /// Compare two funds side by side
    Compare(CompareCommand),
    /// Edit inputs at a prompt and re-run the comparison
    Interactive,
}

impl From<Commands> for fundcmp::AppCommand {
    fn from(cmd: Commands) -> fundcmp::AppCommand {
        match cmd {
            Commands::Funds { filter } => fundcmp::AppCommand::Funds { filter },
            Commands::Compare(args) => fundcmp::AppCommand::Compare(fundcmp::CompareArgs {
                fund_a: args.fund_a,
                fund_b: args.fund_b,
                start: args.start,
                end: args.end,
                amount: args.amount,
                application_date: args.application_date,
                points: args.points,
                json: args.json,
            }),
            Commands::Interactive => fundcmp::AppCommand::Interactive,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|e| format!("{e}, expected YYYY-MM-DD"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => fundcmp::cli::setup::setup_at_path(path),
            None => fundcmp::cli::setup::setup(),
        },
        Some(cmd) => fundcmp::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
