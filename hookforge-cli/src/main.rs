// Copyright 2025 Hookforge (https://github.com/hookforge)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Hookforge CLI
//!
//! Command-line interface for driving plugin lifecycle transitions and
//! inspecting hook dispatch against a file-backed version store.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hookforge_core::{
    plugin_identifier, DispatchReport, EngineConfig, EventName, EventPayload, HookEngine,
    JsonVersionStore, LifecycleEvents, LoggingHandler, TransitionReport, UpdateOutcome,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;

#[derive(Parser)]
#[command(name = "hookforge")]
#[command(about = "Hookforge - plugin lifecycle and hook dispatch", long_about = None)]
struct Cli {
    /// Version store file
    #[arg(short, long, default_value = "./hookforge-state.json")]
    state: PathBuf,

    /// Declarative subscriptions file (.json or .toml)
    #[arg(long)]
    hooks: Option<PathBuf>,

    /// Verbose mode
    #[arg(short, long)]
    verbose: bool,

    /// Output as JSON (machine-readable)
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install a plugin
    Install {
        /// Distributing name (vendor/name style)
        name: String,

        /// Version to install
        version: String,
    },

    /// Update an installed plugin
    Update {
        /// Distributing name (vendor/name style)
        name: String,

        /// Target version
        version: String,
    },

    /// Remove an installed plugin
    Remove {
        /// Distributing name (vendor/name style)
        name: String,
    },

    /// List installed plugins
    List,

    /// Print the canonical lifecycle events for a plugin
    Events {
        /// Distributing name (vendor/name style)
        name: String,
    },

    /// Fire an arbitrary event and print the dispatch report
    Fire {
        /// Event name
        event: String,

        /// Payload data as JSON
        #[arg(long, default_value = "{}")]
        data: String,
    },
}

fn report_json(report: &DispatchReport) -> serde_json::Value {
    serde_json::json!({
        "event": report.event,
        "invoked": report.invoked,
        "succeeded": report.success_count,
        "failed": report.failure_count,
        "total_time_us": report.total_time_us,
        "failures": report
            .failures()
            .map(|(subscriber, error)| serde_json::json!({
                "subscriber": subscriber,
                "error": error.to_string(),
            }))
            .collect::<Vec<_>>(),
    })
}

fn print_transition(result: &TransitionReport, json: bool) {
    if json {
        let out = serde_json::json!({
            "identifier": result.identifier,
            "transition": result.transition,
            "version": result.version,
            "dispatch": report_json(&result.report),
        });
        println!("{}", serde_json::to_string_pretty(&out).unwrap_or_default());
        return;
    }

    println!(
        "✓ {:?} {} ({} subscriber(s), {} failed)",
        result.transition, result.identifier, result.report.invoked, result.report.failure_count
    );
    for (subscriber, error) in result.report.failures() {
        println!("  ✗ {subscriber}: {error}");
    }
}

async fn run(cli: Cli, engine: HookEngine, store: Arc<JsonVersionStore>) -> Result<()> {
    match cli.command {
        Commands::Install { name, version } => {
            let result = engine
                .lifecycle()
                .request_install(&name, &version)
                .await
                .with_context(|| format!("Failed to install {name}"))?;
            print_transition(&result, cli.json);
        }
        Commands::Update { name, version } => {
            let outcome = engine
                .lifecycle()
                .request_update(&name, &version)
                .await
                .with_context(|| format!("Failed to update {name}"))?;
            match outcome {
                UpdateOutcome::Updated(result) => print_transition(&result, cli.json),
                UpdateOutcome::Unchanged {
                    identifier,
                    version,
                } => {
                    if cli.json {
                        let out = serde_json::json!({
                            "identifier": identifier,
                            "transition": "no_op",
                            "version": version,
                        });
                        println!("{}", serde_json::to_string_pretty(&out)?);
                    } else {
                        println!("✓ {identifier} already at {version}, nothing to do");
                    }
                }
            }
        }
        Commands::Remove { name } => {
            let result = engine
                .lifecycle()
                .request_remove(&name)
                .await
                .with_context(|| format!("Failed to remove {name}"))?;
            print_transition(&result, cli.json);
        }
        Commands::List => {
            let entries = store.entries();
            if cli.json {
                let out: Vec<_> = entries
                    .iter()
                    .map(|(id, version)| {
                        serde_json::json!({"identifier": id, "version": version})
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else if entries.is_empty() {
                println!("No plugins installed");
            } else {
                for (id, version) in entries {
                    println!("{id} {version}");
                }
            }
        }
        Commands::Events { name } => {
            let identifier = plugin_identifier(&name)?;
            let events = LifecycleEvents::for_identifier(&identifier);
            if cli.json {
                let out = serde_json::json!({
                    "identifier": identifier,
                    "install": events.install.as_str(),
                    "update": events.update.as_str(),
                    "remove": events.remove.as_str(),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("identifier: {identifier}");
                println!("install:    {}", events.install);
                println!("update:     {}", events.update);
                println!("remove:     {}", events.remove);
            }
        }
        Commands::Fire { event, data } => {
            let event = EventName::new(event.as_str())?;
            let data: serde_json::Value =
                serde_json::from_str(&data).context("Invalid --data JSON")?;
            let payload = EventPayload::new(event, data);
            let report = engine.dispatcher().dispatch(&payload).await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report_json(&report))?);
            } else {
                println!(
                    "✓ Dispatched {} to {} subscriber(s), {} failed",
                    report.event, report.invoked, report.failure_count
                );
                for (subscriber, error) in report.failures() {
                    println!("  ✗ {subscriber}: {error}");
                }
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    // The engine consumes the store as `Arc<dyn VersionStore>`; the CLI
    // keeps its own handle for listing.
    let store = Arc::new(
        JsonVersionStore::open(&cli.state).context("Failed to open version store")?,
    );
    let engine = HookEngine::new(store.clone());

    // Builtin handler available to declarative subscriptions.
    engine
        .register_handler("log", LoggingHandler::new("log"))
        .ok();

    if let Some(path) = &cli.hooks {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read hooks file {}", path.display()))?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => EngineConfig::from_toml(&content)?,
            _ => EngineConfig::from_json(&content)?,
        };
        engine.apply_config(&config)?;
    }

    run(cli, engine, store).await
}
