use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::Value;
use xref_engine::{Engine, EngineConfig, EngineError, ReportFormat, ValidationInput};
use xref_planner::PrioritizationStrategy;
use xref_protocol::AnalysisInput;

mod input;

#[derive(Parser)]
#[command(name = "xref")]
#[command(about = "Cross-source component resolution and consistency validation", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Engine configuration (TOML)
    #[arg(long, global = true, conflicts_with = "preset")]
    config: Option<PathBuf>,

    /// Built-in configuration preset
    #[arg(long, global = true, value_enum)]
    preset: Option<Preset>,

    /// Single-line JSON instead of pretty-printed
    #[arg(long, global = true)]
    compact: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    Default,
    Strict,
    Lenient,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and print the diagnostic report
    Analyze(AnalyzeArgs),

    /// Resolve component mentions across sources
    Correlate(InputArgs),

    /// Match log failure patterns to documented procedures
    #[command(name = "correlate-failures")]
    CorrelateFailures(InputArgs),

    /// Relationship edges, matrix and clusters
    Relationships(InputArgs),

    /// Check correlation output for cross-source violations
    Validate(ValidateArgs),

    /// Build a resolution plan from violations
    Plan(PlanArgs),

    /// Resolve one component name against an inventory
    #[command(name = "resolve-name")]
    ResolveName(ResolveNameArgs),

    /// Print the JSON schema of the extractor input
    Schema,
}

#[derive(Args)]
struct InputArgs {
    /// Extractor output bundle (JSON); `-` reads stdin
    #[arg(default_value = "-")]
    input: PathBuf,
}

#[derive(Args)]
struct AnalyzeArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Report format: comprehensive | executive | technical
    #[arg(long)]
    format: Option<String>,

    /// Prioritization strategy: critical_first | high_impact | quick_wins
    #[arg(long)]
    strategy: Option<String>,

    /// Print every stage output instead of the report alone
    #[arg(long)]
    stages: bool,
}

#[derive(Args)]
struct ValidateArgs {
    /// Correlation output with component_correlations / failure_correlations
    #[arg(default_value = "-")]
    input: PathBuf,

    /// Overall consistency required to meet the threshold
    #[arg(long)]
    threshold: Option<f64>,
}

#[derive(Args)]
struct PlanArgs {
    /// Violation array or validation report (JSON); `-` reads stdin
    #[arg(default_value = "-")]
    input: PathBuf,

    /// Prioritization strategy: critical_first | high_impact | quick_wins
    #[arg(long)]
    strategy: Option<String>,
}

#[derive(Args)]
struct ResolveNameArgs {
    /// Component name to resolve
    name: String,

    /// Inventory (bare, recognizer output or full analysis input)
    #[arg(long)]
    inventory: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match execute(&cli) {
        Ok(output) => emit(&output, cli.compact),
        Err(err) => match err.downcast_ref::<EngineError>() {
            Some(engine_err) => {
                log::error!("{:#}", err);
                emit(&engine_err.to_envelope(), cli.compact)?;
                std::process::exit(1);
            }
            None => Err(err),
        },
    }
}

fn execute(cli: &Cli) -> Result<Value> {
    let mut config = load_config(cli)?;

    let output = match &cli.command {
        Commands::Analyze(args) => {
            if let Some(format) = &args.format {
                config.report_format = format.parse::<ReportFormat>()?;
            }
            apply_strategy(&mut config, args.strategy.as_deref())?;
            let engine = Engine::new(config)?;
            let input: AnalysisInput = input::read_json(&args.input.input)?;
            if args.stages {
                serde_json::to_value(engine.run(&input)?)?
            } else {
                serde_json::to_value(engine.analyze(&input)?)?
            }
        }
        Commands::Correlate(args) => {
            let input: AnalysisInput = input::read_json(&args.input)?;
            serde_json::to_value(Engine::new(config)?.correlate(&input)?)?
        }
        Commands::CorrelateFailures(args) => {
            let input: AnalysisInput = input::read_json(&args.input)?;
            serde_json::to_value(Engine::new(config)?.correlate_failures(&input)?)?
        }
        Commands::Relationships(args) => {
            let input: AnalysisInput = input::read_json(&args.input)?;
            serde_json::to_value(Engine::new(config)?.relationships(&input)?)?
        }
        Commands::Validate(args) => {
            if let Some(threshold) = args.threshold {
                config.consistency_threshold = threshold;
            }
            let engine = Engine::new(config)?;
            let input: ValidationInput = input::read_json(&args.input)?;
            if input.is_empty() {
                log::warn!("Nothing to validate; reporting a vacuous pass");
            }
            serde_json::to_value(engine.validate(&input))?
        }
        Commands::Plan(args) => {
            apply_strategy(&mut config, args.strategy.as_deref())?;
            let engine = Engine::new(config)?;
            let records = input::violation_records(&args.input)?;
            serde_json::to_value(engine.plan_json(&records)?)?
        }
        Commands::ResolveName(args) => {
            let inventory = input::inventory(&args.inventory)?;
            serde_json::to_value(Engine::new(config)?.resolve_name(&args.name, &inventory)?)?
        }
        Commands::Schema => xref_protocol::input_schema(),
    };

    Ok(output)
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    if let Some(path) = &cli.config {
        log::debug!("Loading configuration from {}", path.display());
        return Ok(EngineConfig::from_file(path)?);
    }
    Ok(match cli.preset.unwrap_or(Preset::Default) {
        Preset::Default => EngineConfig::default(),
        Preset::Strict => EngineConfig::strict(),
        Preset::Lenient => EngineConfig::lenient(),
    })
}

fn apply_strategy(config: &mut EngineConfig, strategy: Option<&str>) -> Result<()> {
    if let Some(raw) = strategy {
        config.resolution_strategy = raw.parse::<PrioritizationStrategy>().map_err(EngineError::from)?;
    }
    Ok(())
}

fn emit<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let rendered = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    }
    .context("Failed to serialize output")?;
    println!("{}", rendered);
    Ok(())
}
