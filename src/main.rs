use analytics::{AnalyticsEngine, AnalyticsError, KpiCalculator};
use anyhow::Context;
use clap::{Parser, Subcommand};
use configuration::{logging, Config, Delimiter};
use core_types::IntoTable;
use ingest::{cleaned_table, IngestError, Loader};
use report::{Manifest, ReportAssembler};
use std::path::PathBuf;
use std::process::ExitCode;

/// The main entry point for the sales statistics application.
fn main() -> ExitCode {
    // Load SALESSTAT__* overrides from a .env file, if there is one.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let config = match configuration::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(3);
        }
    };

    // Held until exit so the file appender flushes.
    let _guard = match logging::init(&config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(3);
        }
    };

    tracing::debug!(?config, "configuration loaded");

    // Execute the appropriate command
    let result = match cli.command {
        Commands::Analyze(args) => handle_analyze(args, config),
        Commands::Clean(args) => handle_clean(args, config),
        Commands::Kpis(args) => handle_kpis(args, config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Descriptive sales analytics over a CSV of transactions.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file (defaults to ./salesstat.toml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every analysis and write the result tables.
    Analyze(AnalyzeArgs),
    /// Apply the cleaning rules and write the cleaned records.
    Clean(CleanArgs),
    /// Print the key performance indicators only.
    Kpis(KpisArgs),
}

#[derive(Parser)]
struct AnalyzeArgs {
    /// The sales CSV to analyse (overrides `paths.input`).
    #[arg(long)]
    input: Option<PathBuf>,

    /// Directory for the result tables (overrides `paths.output_dir`).
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Trailing window in days for the daily moving average.
    #[arg(long)]
    window: Option<usize>,

    /// Field separator for the written tables.
    #[arg(long, value_enum)]
    delimiter: Option<Delimiter>,

    /// Also print every table to stdout.
    #[arg(long)]
    print: bool,
}

#[derive(Parser)]
struct CleanArgs {
    /// The raw sales CSV.
    #[arg(long)]
    input: PathBuf,

    /// Where to write the cleaned CSV.
    #[arg(long)]
    output: PathBuf,
}

#[derive(Parser)]
struct KpisArgs {
    /// The sales CSV to analyse (overrides `paths.input`).
    #[arg(long)]
    input: Option<PathBuf>,
}

// ==============================================================================
// Command Logic
// ==============================================================================

/// Loads, analyses and writes every table plus the run manifest.
fn handle_analyze(args: AnalyzeArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(input) = args.input {
        config.paths.input = input;
    }
    if let Some(dir) = args.output_dir {
        config.paths.output_dir = dir;
    }
    if let Some(window) = args.window {
        config.analysis.moving_average_window = window;
    }
    if let Some(delimiter) = args.delimiter {
        config.report.delimiter = delimiter;
    }
    config.report.print_tables |= args.print;

    let outcome = Loader::new().load(&config.paths.input)?;
    let engine = AnalyticsEngine::new(&config.analysis)?;
    let analysis = engine.calculate(&outcome.records, None)?;

    let tables = analysis.tables();
    if config.report.print_tables {
        for table in &tables {
            println!("{}\n", report::render(table));
        }
    }

    let assembler = ReportAssembler::new(&config.paths.output_dir, config.report.delimiter);
    let artifacts = assembler
        .write_all(&tables)
        .context("failed to write result tables")?;
    let manifest_path = assembler.write_manifest(&Manifest {
        run_id: analysis.run_id,
        generated_at: analysis.generated_at,
        record_count: analysis.record_count,
        artifacts,
    })?;

    println!(
        "Analysed {} records; {} tables written to {} (manifest: {})",
        analysis.record_count,
        tables.len(),
        assembler.output_dir().display(),
        manifest_path.display()
    );
    Ok(())
}

/// Applies the cleaning rules and writes the cleaned record table.
fn handle_clean(args: CleanArgs, config: Config) -> anyhow::Result<()> {
    let outcome = Loader::new().load(&args.input)?;

    let table = cleaned_table(&outcome.records);
    let dir = args.output.parent().map(PathBuf::from).unwrap_or_default();
    let artifact = ReportAssembler::new(dir, config.report.delimiter)
        .write_table_to(&table, &args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    let summary = &outcome.summary;
    println!(
        "Kept {} of {} rows ({} duplicates, {} missing fields, {} non-positive); wrote {}",
        summary.kept,
        summary.raw_rows,
        summary.duplicates,
        summary.missing_fields,
        summary.non_positive,
        artifact.file
    );
    Ok(())
}

/// Prints the KPI table.
fn handle_kpis(args: KpisArgs, config: Config) -> anyhow::Result<()> {
    let input = args.input.unwrap_or(config.paths.input);
    let outcome = Loader::new().load(&input)?;
    let kpis = KpiCalculator::new().calculate(&outcome.records)?;
    println!("{}", report::render(&kpis.to_table()));
    Ok(())
}

/// 1: input missing, 2: schema or field validation, 3: anything else.
fn exit_code(error: &anyhow::Error) -> u8 {
    if let Some(e) = error.downcast_ref::<IngestError>() {
        return match e {
            IngestError::DataNotFound(_) => 1,
            e if e.is_validation_error() => 2,
            _ => 3,
        };
    }
    if let Some(AnalyticsError::EmptyDataset | AnalyticsError::InvalidValue(_)) =
        error.downcast_ref::<AnalyticsError>()
    {
        return 2;
    }
    3
}
