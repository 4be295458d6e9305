use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use graphflow_rs::kinetic::config::Settings;
use graphflow_rs::kinetic::server;
use graphflow_rs::kinetic::tools::code_review;
use graphflow_rs::kinetic::workflow::graph::{ExecutionResult, GraphEngine, RunStatus};
use graphflow_rs::kinetic::workflow::loader::GraphLoader;
use graphflow_rs::kinetic::workflow::registry::ToolRegistry;
use serde_json::{json, Value};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Address to bind (overrides GRAPHFLOW_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides GRAPHFLOW_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run a graph definition file
    Run {
        /// Path to the graph file (YAML or JSON)
        #[arg(short, long)]
        file: String,

        /// Initial state as a JSON object
        #[arg(short, long, conflicts_with = "state_file")]
        state: Option<String>,

        /// File holding the initial state (YAML or JSON)
        #[arg(long)]
        state_file: Option<String>,

        /// Iteration limit (overrides GRAPHFLOW_MAX_ITERATIONS)
        #[arg(short, long)]
        max_iterations: Option<usize>,
    },
    /// Run the built-in code review workflow on a Python file
    Review {
        /// Python source file to review
        #[arg(short, long)]
        file: String,

        /// Iteration limit (overrides GRAPHFLOW_MAX_ITERATIONS)
        #[arg(short, long)]
        max_iterations: Option<usize>,
    },
    /// List registered step functions
    Tools,
}

fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    code_review::register_tools(&mut registry);
    for name in registry.list() {
        log::info!("Registered tool: {}", name);
    }
    registry
}

fn print_result(result: &ExecutionResult) -> anyhow::Result<()> {
    let output = json!({
        "status": result.status(),
        "final_state": result.final_state,
        "execution_log": result.execution_log,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    if result.status() == RunStatus::Failed {
        if let Some(last) = result.execution_log.last() {
            log::warn!("Run stopped at node '{}': {}", last.node, last.message);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let mut settings = Settings::from_env()?;

    match args.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                settings.host = host;
            }
            if let Some(port) = port {
                settings.port = port;
            }
            server::serve(&settings, default_registry()).await?;
        }
        Commands::Run {
            file,
            state,
            state_file,
            max_iterations,
        } => {
            let loader = GraphLoader::new();
            let graph = loader
                .load_graph(&file)
                .with_context(|| format!("failed to load graph from {}", file))?;

            let initial: Value = match (state, state_file) {
                (Some(raw), _) => serde_json::from_str(&raw).context("--state is not valid JSON")?,
                (None, Some(path)) => loader.load_state(&path)?,
                (None, None) => json!({}),
            };

            let registry = default_registry();
            let result = GraphEngine::new(&graph, &registry)
                .with_max_iterations(max_iterations.unwrap_or(settings.max_iterations))
                .execute_value(initial)?;
            print_result(&result)?;
        }
        Commands::Review {
            file,
            max_iterations,
        } => {
            let code = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file))?;
            let graph = code_review::code_review_graph()?;

            let registry = default_registry();
            let result = GraphEngine::new(&graph, &registry)
                .with_max_iterations(max_iterations.unwrap_or(settings.max_iterations))
                .execute_value(json!({ "code": code }))?;
            print_result(&result)?;
        }
        Commands::Tools => {
            for name in default_registry().list() {
                println!("{}", name);
            }
        }
    }

    Ok(())
}
