//! CLI entrypoint for dockhand
//!
//! This is the main binary that wires together all layers using
//! dependency injection: the static tool graph, the handler registry, the
//! in-memory session store, and the router.

mod serve;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dockhand_application::{RouteRequest, ToolRouter};
use dockhand_domain::{Step, ToolGraph};
use dockhand_infrastructure::{default_registry, ConfigLoader, InMemorySessionStore};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dockhand", version, about = "Containerization automation server")]
struct Cli {
    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to an explicit config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Workspace root the tools operate on (overrides config)
    #[arg(long, global = true)]
    workspace: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the tools in the dependency graph
    Tools,
    /// Print the execution plan for a tool
    Plan {
        /// Target tool name
        tool: String,
        /// Steps to treat as already satisfied
        #[arg(long, value_delimiter = ',')]
        completed: Vec<Step>,
    },
    /// Route one tool to completion
    Run {
        /// Target tool name
        tool: String,
        /// Params bag as a JSON object, shared by every tool in the chain
        #[arg(long)]
        params: Option<String>,
        /// Session to resume
        #[arg(long)]
        session: Option<String>,
        /// Bypass idempotency and precondition resolution
        #[arg(long)]
        force: bool,
    },
    /// Serve route requests as JSON lines over stdin/stdout
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow::anyhow!(e))?;
    if let Some(workspace) = cli.workspace {
        config.workspace.root = Some(workspace);
    }

    // === Dependency Injection ===
    let graph = Arc::new(ToolGraph::containerization());
    let registry = Arc::new(default_registry());
    let store = Arc::new(InMemorySessionStore::new(
        config.session.ttl_secs,
        config.session.max_sessions,
    ));
    let router = ToolRouter::new(Arc::clone(&graph), registry, store);
    let ctx = config.tool_context();

    info!("Starting dockhand");

    match cli.command {
        Command::Tools => {
            for name in graph.tool_names() {
                let meta = graph.metadata(name).expect("name came from the graph");
                let requires: Vec<&str> = meta.requires.iter().map(Step::as_str).collect();
                let produces: Vec<&str> = meta.produces.iter().map(Step::as_str).collect();
                println!(
                    "{:24} requires: [{}]  produces: [{}]",
                    name,
                    requires.join(", "),
                    produces.join(", ")
                );
            }
        }
        Command::Plan { tool, completed } => {
            let completed: BTreeSet<Step> = completed.into_iter().collect();
            let plan = router.execution_plan(&tool, &completed)?;
            for name in plan {
                println!("{}", name);
            }
        }
        Command::Run {
            tool,
            params,
            session,
            force,
        } => {
            let params: Value = match params {
                Some(raw) => serde_json::from_str(&raw)?,
                None => Value::Null,
            };

            let mut request = RouteRequest::new(tool).with_params(params);
            if let Some(session) = session {
                request = request.with_session(session);
            }
            if force {
                request = request.forced();
            }

            let outcome = router.route(request, &ctx).await;
            let failed = outcome.result.is_err();
            println!("{}", serde_json::to_string_pretty(&serve::outcome_to_json(outcome))?);
            if failed {
                std::process::exit(1);
            }
        }
        Command::Serve => {
            serve::run(&router, &ctx).await?;
        }
    }

    Ok(())
}
