use anyhow::Context;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use tracing::error;

use station_entities::config::Config;
use station_entities::logging;
use station_entities::pipeline::serialize::OutputFormat;
use station_entities::pipeline::Pipeline;

#[derive(Parser)]
#[command(name = "station_entities")]
#[command(about = "Turn an SBB stop list into station entities with alternate spellings")]
#[command(version = "0.1.0")]
struct Cli {
    /// Semicolon-separated stop list
    input: PathBuf,

    /// Where to write the entities
    output: PathBuf,

    /// Write a JSON alternate -> entity lookup instead of CSV rows
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_value = "false",
        default_missing_value = "true",
        action = ArgAction::Set
    )]
    json: bool,

    /// Only keep allowed stop types (implied by the bus options)
    #[arg(long)]
    filter: bool,

    /// Operators a stop must be served by, rail or not (comma-separated)
    #[arg(long)]
    allowed_bus_operators: Option<String>,

    /// Keep stops without rail service only if their name contains one of these (comma-separated)
    #[arg(long)]
    no_busses_except_for: Option<String>,

    /// The input starts with a header row
    #[arg(long)]
    has_header: bool,

    /// TOML file with extra rewrite rules
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Also write JSON logs into this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let _guard = logging::init_logging(cli.log_dir.as_deref());

    let config = Config::new(cli.input, cli.output)
        .with_format(OutputFormat::from_json_flag(cli.json))
        .with_header(cli.has_header)
        .with_rules_file(cli.rules)
        .with_filters(
            cli.filter,
            cli.allowed_bus_operators.as_deref(),
            cli.no_busses_except_for.as_deref(),
        )
        .context("invalid arguments")?;

    println!("🚉 Building station entities from {}...", config.input.display());

    let result = match Pipeline::run(&config) {
        Ok(result) => result,
        Err(e) => {
            error!("Pipeline failed: {}", e);
            println!("❌ Pipeline failed: {}", e);
            return Err(e).context("station entity pipeline failed");
        }
    };

    println!("\n📊 Pipeline Results:");
    println!("   Rows read: {}", result.rows_read);
    println!("   Rows kept: {}", result.rows_kept);
    println!("   Rows filtered: {}", result.rows_filtered);
    println!("   Blank names skipped: {}", result.blank_names);
    println!("   Entities: {}", result.entities);
    println!("   Alternates generated: {}", result.alternates_generated);
    println!("   Conflicts resolved: {}", result.collisions.len());
    println!("   Alternates kept: {}", result.alternates_kept);
    println!("   Merged entities: {}", result.merged_entities);
    println!("   Format: {}", result.format);
    println!("   Output file: {}", result.output_file.display());
    println!("✅ Done");

    Ok(())
}
