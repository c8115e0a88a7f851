// Fantasy eleven predictor entry point.
//
// Startup sequence:
// 1. Parse the command line
// 2. Initialize tracing (log to file, stdout carries the report)
// 3. Load config, copying defaults on first run
// 4. Run the requested command

mod export;
mod points_table;
mod report;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use elevenpick_core::config;
use elevenpick_core::lineup::MatchInput;
use elevenpick_core::pipeline::{MatchData, Predictor};

#[derive(Parser)]
#[command(name = "elevenpick")]
#[command(about = "Pick a fantasy cricket eleven from historical stats", long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score both playing elevens and pick a team
    Predict {
        /// Match file (team1, team2, venue, team1_playing11, team2_playing11)
        #[arg(short, long = "match", value_name = "FILE")]
        match_file: PathBuf,

        /// Print the report without writing the team file
        #[arg(long)]
        no_export: bool,
    },
    /// Fetch and print the league points table
    PointsTable,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose)?;
    info!("elevenpick starting up");

    let base_dir = std::env::current_dir().context("failed to resolve working directory")?;
    let copied = config::ensure_config_files(&base_dir).context("failed to prepare config files")?;
    for path in &copied {
        info!("created {} from defaults", path.display());
    }
    let config = config::load_config_from(&base_dir).context("failed to load configuration")?;

    match cli.command {
        Command::Predict {
            match_file,
            no_export,
        } => {
            let input = MatchInput::load(&match_file)
                .with_context(|| format!("failed to load match file {}", match_file.display()))?;
            let data = MatchData::load(&base_dir, &config.data_paths)
                .context("failed to load stats and squads")?;

            let prediction = Predictor::new(&config, &data).predict(&input);
            print!("{}", report::render(&prediction, &config.rules));

            if !no_export {
                let path = base_dir.join(&config.output.team_json);
                let document = export::TeamExport::from_prediction(&prediction, chrono::Local::now());
                export::write(&path, &document)
                    .with_context(|| format!("failed to export team to {}", path.display()))?;
                println!("\nTeam data saved to {}", path.display());
            }
        }
        Command::PointsTable => {
            let rows = points_table::fetch(&config.points_table)
                .await
                .context("failed to fetch points table")?;
            let path = base_dir.join(&config.output.points_table_json);
            points_table::save(&path, &rows)
                .with_context(|| format!("failed to save points table to {}", path.display()))?;
            print!("{}", points_table::render(&rows));
            println!("\nSaved {} teams to {}", rows.len(), path.display());
        }
    }

    info!("elevenpick finished");
    Ok(())
}

/// Initialize tracing to log to a file so stdout stays clean for the report.
fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("elevenpick.log"))?;

    let default_filter = if verbose {
        "elevenpick_core=debug,elevenpick=debug,warn"
    } else {
        "elevenpick_core=info,elevenpick=info,warn"
    };

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
