use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use tracing::instrument::WithSubscriber;
use tracing_subscriber::EnvFilter;

use steward_core::{OutputFormat, StewardConfig, StewardError};
use steward_health::github::GitHubClient;
use steward_health::llm::OllamaClient;
use steward_health::orchestrator::Orchestrator;
use steward_health::resolver::ProjectResolver;
use steward_health::sink::FileSink;

const CONFIG_FILE: &str = ".steward.toml";

#[derive(Parser)]
#[command(
    name = "steward",
    version,
    about = "Project health analysis for open pull requests",
    long_about = "Steward reads the open pull requests of a GitHub reports repository,\n\
                   works out which project each one is about, gathers that project's\n\
                   reports and asks a local LLM for a step-by-step health evaluation.\n\n\
                   Examples:\n  \
                     steward init                          Create a .steward.toml config file\n  \
                     steward run --repo hyperledger/toc    Analyze every open pull request\n  \
                     steward projects                      Show the known project catalog"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (default: .steward.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// GitHub token (default: GITHUB_TOKEN env var)
    #[arg(long, global = true)]
    github_token: Option<String>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text  Human-readable summary (default)\n  \
                         json  Machine-readable JSON with camelCase keys"
    )]
    format: OutputFormat,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze every open pull request
    #[command(long_about = "Analyze every open pull request.\n\n\
        Each pull request is matched against the project catalog, its reports are\n\
        collected from the pull request and the repository, and the LLM analyzes\n\
        them one by one before writing a final summary. Progress is written to the\n\
        result file after every step.\n\n\
        Examples:\n  steward run\n  steward run --repo hyperledger/toc --model mistral\n  steward run --output health.txt --format json")]
    Run {
        /// Repository to read (format: owner/repo)
        #[arg(long)]
        repo: Option<String>,
        /// Override the configured model
        #[arg(long)]
        model: Option<String>,
        /// Override the configured result file
        #[arg(long)]
        output: Option<PathBuf>,
        /// Never ask the LLM for a project name
        #[arg(long)]
        no_inference: bool,
    },
    /// Print the project catalog used for matching
    #[command(long_about = "Print the project catalog used for matching.\n\n\
        Reads the schedule table configured under [github] schedule_path. When it\n\
        cannot be read, falls back to words taken from repository file names.")]
    Projects {
        /// Repository to read (format: owner/repo)
        #[arg(long)]
        repo: Option<String>,
    },
    /// Create a default .steward.toml configuration file
    #[command(long_about = "Create a default .steward.toml configuration file.\n\n\
        Generates a commented template with all available options.\n\
        Fails if .steward.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

const DEFAULT_CONFIG: &str = r#"# Steward Configuration

[github]
# Repository holding the project reports
# owner = "hyperledger"
# repo = "toc"
# schedule_path = "tac/project-updates/2025/2025-schedule.md"

[llm]
# Ollama-compatible endpoint
# base_url = "http://localhost:11434"
# model = "llama3"
# timeout_secs = 120

[resolver]
# "substring" takes the first catalog entry found in the pull request text,
# "longest" prefers the longest one
# matcher = "substring"
# infer_with_llm = true

[output]
# result_file = "analysis_result.txt"
"#;

fn load_config(path: Option<&Path>) -> Result<StewardConfig> {
    let config = match path {
        Some(path) => StewardConfig::from_file(path)?,
        None => {
            let default_path = Path::new(CONFIG_FILE);
            if default_path.exists() {
                StewardConfig::from_file(default_path)?
            } else {
                StewardConfig::default()
            }
        }
    };
    Ok(config)
}

fn apply_repo(config: &mut StewardConfig, repo: Option<&str>) -> Result<()> {
    let Some(repo) = repo else {
        return Ok(());
    };
    let Some((owner, name)) = repo.split_once('/') else {
        miette::bail!(
            help = "use the form owner/repo, e.g. hyperledger/toc",
            "invalid repository '{repo}'"
        );
    };
    config.github.owner = owner.to_string();
    config.github.repo = name.to_string();
    Ok(())
}

fn log_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!(
            "{level},h2=warn,hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn"
        ))
    })
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    let token = cli.github_token.as_deref();

    match cli.command {
        Command::Run {
            repo,
            model,
            output,
            no_inference,
        } => {
            apply_repo(&mut config, repo.as_deref())?;
            if let Some(model) = model {
                config.llm.model = model;
            }
            if let Some(output) = output {
                config.output.result_file = output;
            }
            if no_inference {
                config.resolver.infer_with_llm = false;
            }

            let source = GitHubClient::new(token, &config.github)?;
            let llm = OllamaClient::new(&config.llm)?;
            let sink = FileSink::new(&config.output.result_file);
            let resolver = ProjectResolver::from_config(&config.github, &config.resolver);
            tracing::info!(
                repo = %format!("{}/{}", config.github.owner, config.github.repo),
                model = llm.model(),
                "starting analysis run"
            );

            let summary = Orchestrator::new(&source, &llm, &sink, resolver)
                .infer_with_llm(config.resolver.infer_with_llm)
                .run()
                .await?;

            match cli.format {
                OutputFormat::Json => {
                    let json = serde_json::to_string_pretty(&summary).map_err(StewardError::from)?;
                    println!("{json}");
                }
                OutputFormat::Text => {
                    print!("{summary}");
                    println!("\nResults: {}", sink.path().display());
                }
            }
        }
        Command::Projects { repo } => {
            apply_repo(&mut config, repo.as_deref())?;
            let source = GitHubClient::new(token, &config.github)?;
            let resolver = ProjectResolver::from_config(&config.github, &config.resolver);
            let projects = resolver.discover(&source).await?;

            match cli.format {
                OutputFormat::Json => {
                    let json = serde_json::to_string_pretty(&projects).map_err(StewardError::from)?;
                    println!("{json}");
                }
                OutputFormat::Text => {
                    if projects.is_empty() {
                        println!("No projects found.");
                    }
                    for project in &projects {
                        println!("{project}");
                    }
                }
            }
        }
        Command::Init => {
            let path = Path::new(CONFIG_FILE);
            if path.exists() {
                miette::bail!("{CONFIG_FILE} already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created {CONFIG_FILE} with default configuration");
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "steward", &mut std::io::stdout());
        }
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.verbose))
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    run(cli).with_subscriber(subscriber).await
}
