mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::forecast::ForecastArgs;
use commands::investment::InvestmentArgs;
use commands::ranking::RankArgs;
use commands::rating::ClassifyArgs;
use commands::scoring::CompositeScoreArgs;

/// Capital planning decision engine
#[derive(Parser)]
#[command(
    name = "capplan",
    version,
    about = "Capital planning decision engine",
    long_about = "A CLI for the capital planning decision engine: weighted multi-criteria \
                  composite scoring and ranking, single-investment financial analysis \
                  (NPV, IRR, payback, ROI, benefit-cost ratio), multi-year portfolio \
                  forecasting under inflation and deterioration trends, and score-to-grade \
                  classification, all with decimal precision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute one project's weighted composite score
    CompositeScore(CompositeScoreArgs),
    /// Score and rank every scoreable project in a portfolio
    Rank(RankArgs),
    /// Analyze a single investment (NPV, IRR, payback, ROI, BCR)
    Investment(InvestmentArgs),
    /// Forecast portfolio maintenance cost, condition, and risk
    Forecast(ForecastArgs),
    /// Classify a score into a letter grade and status zone
    Classify(ClassifyArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::CompositeScore(args) => commands::scoring::run_composite_score(args),
        Commands::Rank(args) => commands::ranking::run_rank(args),
        Commands::Investment(args) => commands::investment::run_investment(args),
        Commands::Forecast(args) => commands::forecast::run_forecast(args),
        Commands::Classify(args) => commands::rating::run_classify(args),
        Commands::Version => {
            println!("capplan {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
