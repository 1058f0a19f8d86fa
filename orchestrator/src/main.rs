//! SoM orchestration CLI
//!
//! Usage:
//!   som run product_launch crisis_management
//!   som run interactive --brief "Plan a developer conference"
//!   som run --all --non-interactive --parallel
//!   som scenarios list
//!   som scenarios show product_launch
//!   som roles list
//!   som roles show data_analyst

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use som_agent::build_llm;
use som_agent::config::{Provider, SomFileConfig};
use som_orchestrator::{
    AgentRole, AutoApproveGate, CheckpointGate, DriverConfig, InteractiveGate, RoleRegistry,
    ScenarioCatalog, ScenarioDriver, TeamKind,
};

#[derive(Parser)]
#[command(name = "som")]
#[command(about = "Society-of-Mind team orchestration with human checkpoints")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Model backend (openai, ollama, offline)
    #[arg(long, env = "SOM_PROVIDER", global = true)]
    provider: Option<Provider>,

    /// Default model to use
    #[arg(short = 'm', long, env = "SOM_MODEL", global = true)]
    model: Option<String>,

    /// Directory with custom scenario files
    #[arg(long, global = true)]
    scenarios_dir: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace). Default is warn.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, env = "SOM_LOG_JSON", global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one or more scenarios
    Run {
        /// Scenario ids (e.g., "product_launch", "crisis_management")
        ids: Vec<String>,

        /// Run every scenario in the catalog
        #[arg(long, conflicts_with = "ids")]
        all: bool,

        /// Brief for the interactive scenario
        #[arg(long)]
        brief: Option<String>,

        /// Auto-approve checkpoints instead of prompting
        #[arg(long)]
        non_interactive: bool,

        /// Run scenarios concurrently
        #[arg(long)]
        parallel: bool,

        /// Revision rounds allowed per run
        #[arg(long)]
        max_revisions: Option<u32>,

        /// Write a JSON report per run into this directory
        #[arg(long)]
        results_dir: Option<PathBuf>,
    },
    /// Scenario catalog
    Scenarios {
        #[command(subcommand)]
        command: ScenarioCommands,
    },
    /// Agent roles
    Roles {
        #[command(subcommand)]
        command: RoleCommands,
    },
}

#[derive(Subcommand)]
enum ScenarioCommands {
    /// List available scenarios
    List,
    /// Show a scenario definition
    Show {
        /// Scenario id
        id: String,
    },
}

#[derive(Subcommand)]
enum RoleCommands {
    /// List roles by team
    List,
    /// Show role configuration
    Show {
        /// Role id (e.g., "data_analyst")
        role: String,
    },
}

/// Initialize tracing with the given verbosity level
///
/// - 0: warn (default)
/// - 1: info (-v)
/// - 2: debug (-vv)
/// - 3+: trace (-vvv)
fn init_tracing(verbosity: u8, json: bool) {
    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    // Allow RUST_LOG to override if set
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string()));

    // Logs go to stderr; stdout carries checkpoints and reports
    tracing_subscriber::registry()
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(io::stderr)))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    let mut file_config = SomFileConfig::load()?;
    if let Some(provider) = cli.provider {
        file_config.llm.provider = provider;
    }
    if let Some(model) = cli.model {
        file_config.llm.model = model;
    }
    if let Some(dir) = cli.scenarios_dir {
        file_config.run.scenarios_dir = Some(dir);
    }

    let catalog = ScenarioCatalog::discover(file_config.run.scenarios_dir.as_deref());

    let mut registry = RoleRegistry::with_defaults();
    registry.apply_overrides(&file_config.roles)?;

    match cli.command {
        Commands::Run {
            ids,
            all,
            brief,
            non_interactive,
            parallel,
            max_revisions,
            results_dir,
        } => {
            if let Some(max) = max_revisions {
                file_config.run.max_revisions = max;
            }
            if parallel {
                file_config.run.parallel = true;
            }
            if let Some(dir) = results_dir {
                file_config.run.results_dir = Some(dir);
            }
            let options = RunOptions {
                ids,
                all,
                brief,
                non_interactive,
            };
            run_scenarios(options, file_config, catalog, registry).await
        }
        Commands::Scenarios { command } => run_scenarios_command(command, &catalog),
        Commands::Roles { command } => run_roles_command(command, &registry, &file_config),
    }
}

struct RunOptions {
    ids: Vec<String>,
    all: bool,
    brief: Option<String>,
    non_interactive: bool,
}

async fn run_scenarios(
    options: RunOptions,
    file_config: SomFileConfig,
    mut catalog: ScenarioCatalog,
    registry: RoleRegistry,
) -> Result<()> {
    let ids = if options.all {
        catalog.ids()
    } else {
        options.ids
    };
    if ids.is_empty() {
        anyhow::bail!("No scenarios given. Pass scenario ids or --all (see 'som scenarios list').");
    }

    let wants_interactive = ids.iter().any(|id| id == "interactive");
    match options.brief {
        Some(brief) => {
            catalog.set_brief("interactive", brief);
        }
        None if wants_interactive && !options.non_interactive => {
            let brief = read_brief()?;
            catalog.set_brief("interactive", brief);
        }
        None => {}
    }

    let mut config = DriverConfig::from_file_config(&file_config)?;
    if config.parallel && !options.non_interactive {
        tracing::warn!("Parallel runs need --non-interactive; running sequentially");
        config.parallel = false;
    }

    let gate: Arc<dyn CheckpointGate> = if options.non_interactive {
        Arc::new(AutoApproveGate)
    } else {
        Arc::new(InteractiveGate::stdin())
    };
    let llm = build_llm(&file_config.llm)?;

    let driver = ScenarioDriver::new(config, catalog, registry, llm, gate);
    let results = driver.execute(ids.as_slice()).await?;

    println!("\n{:<22} {:<28} {:>8} {:>7} {:>9}", "SCENARIO", "OUTCOME", "QUALITY", "ROUNDS", "TIME");
    println!("{}", "─".repeat(78));
    for (scenario, metrics) in &results {
        let quality = metrics
            .quality_score
            .map(|q| format!("{:.1}", q))
            .unwrap_or_else(|| "-".to_string());
        let mut outcome = metrics.outcome.to_string();
        if outcome.len() > 28 {
            outcome = format!("{}…", outcome.chars().take(27).collect::<String>());
        }
        println!(
            "{:<22} {:<28} {:>8} {:>7} {:>7}ms",
            scenario.id, outcome, quality, metrics.drafting_rounds, metrics.elapsed_ms
        );
    }

    let metrics: Vec<_> = results.into_iter().map(|(_, m)| m).collect();
    println!("\n{}", ScenarioDriver::summary(&metrics));

    Ok(())
}

/// Ask for the interactive scenario's brief on stdin
fn read_brief() -> Result<String> {
    print!("Enter the scenario brief: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn run_scenarios_command(command: ScenarioCommands, catalog: &ScenarioCatalog) -> Result<()> {
    match command {
        ScenarioCommands::List => {
            println!("Available Scenarios:\n");
            for scenario in catalog.iter() {
                let summary = scenario
                    .brief
                    .lines()
                    .next()
                    .filter(|l| !l.trim().is_empty())
                    .unwrap_or("(brief supplied at run time with --brief)");
                println!("  {} - {}", scenario.id, scenario.name);
                println!("      {}", summary);
            }
            println!("\nRun a scenario with: som run <id>");
        }

        ScenarioCommands::Show { id } => match catalog.get(&id) {
            Some(scenario) => {
                println!("Scenario: {}\n", scenario.name);
                println!("Id: {}", scenario.id);
                println!("Success criterion: {}", scenario.success_criterion);
                let teams: Vec<_> = scenario
                    .inner_teams()
                    .iter()
                    .map(TeamKind::to_string)
                    .collect();
                println!("Teams: {}", teams.join(", "));
                println!("\nBrief:\n{}", scenario.full_brief());
            }
            None => {
                eprintln!("Scenario '{}' not found.", id);
                eprintln!("Use 'som scenarios list' to see available scenarios.");
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

fn run_roles_command(
    command: RoleCommands,
    registry: &RoleRegistry,
    file_config: &SomFileConfig,
) -> Result<()> {
    let default_model = &file_config.llm.model;

    match command {
        RoleCommands::List => {
            println!("Available Roles:\n");
            for team in TeamKind::INNER.into_iter().chain([TeamKind::Coordination]) {
                println!("{}:", team);
                for role in team.roles() {
                    let config = registry.get(*role);
                    println!(
                        "  {} ({}, t={}) - {}",
                        role.id(),
                        config.model.as_deref().unwrap_or(default_model),
                        config.temperature,
                        role.display_name()
                    );
                }
            }
        }

        RoleCommands::Show { role } => match role.parse::<AgentRole>() {
            Ok(role) => {
                let config = registry.get(role);
                println!("Role: {}\n", role.id());
                println!("Display Name: {}", role.display_name());
                println!("Team: {}", role.team());
                println!(
                    "Model: {}",
                    config.model.as_deref().unwrap_or(default_model)
                );
                println!("Temperature: {}", config.temperature);
                if let Some(max) = config.max_tokens {
                    println!("Max Tokens: {}", max);
                }
                let capabilities: Vec<_> = role
                    .capabilities()
                    .iter()
                    .map(|c| format!("{:?}", c))
                    .collect();
                println!("Capabilities: {}", capabilities.join(", "));
                println!("\nSystem Prompt:\n{}", role.system_prompt());
            }
            Err(e) => {
                eprintln!("{}", e);
                eprintln!("Use 'som roles list' to see available roles.");
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
