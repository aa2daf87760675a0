mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "forge-cli")]
#[command(about = "Forge CLI - Check test case sets, grade judge output, summarize submissions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a JSON array of test cases
    Validate {
        /// Path to the test case file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Grade a JSON array of judge test results
    Grade {
        /// Path to the results file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Compare an expected and an actual output file
    Compare {
        /// Expected output file
        #[arg(short, long)]
        expected: PathBuf,

        /// Actual output file
        #[arg(short, long)]
        actual: PathBuf,

        /// Byte-for-byte comparison, no normalization
        #[arg(long, default_value = "false")]
        strict: bool,
    },

    /// Summarize submissions from a file or from Redis
    Summary {
        /// JSON array of submissions
        #[arg(short, long, conflicts_with_all = ["user", "problem"])]
        file: Option<PathBuf>,

        /// Summarize a user's stored submissions
        #[arg(short, long, conflicts_with = "problem")]
        user: Option<String>,

        /// Summarize a problem's stored submissions
        #[arg(short, long)]
        problem: Option<String>,

        /// Redis URL (defaults to REDIS_URL)
        #[arg(long)]
        redis_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { file } => {
            commands::validate_file(&file)?;
        }
        Commands::Grade { file } => {
            commands::grade_file(&file)?;
        }
        Commands::Compare {
            expected,
            actual,
            strict,
        } => {
            commands::compare_files(&expected, &actual, strict)?;
        }
        Commands::Summary {
            file,
            user,
            problem,
            redis_url,
        } => {
            let source = commands::SummarySource::from_args(file, user, problem)?;
            commands::summarize(source, redis_url.as_deref()).await?;
        }
    }

    Ok(())
}
