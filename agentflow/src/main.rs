//! agentflow - Entry Point
//!
//! Inspects workflow definitions, serves the workflow API locally and
//! drives a remote workflow backend.

use std::collections::HashMap;
use std::env;
use std::process::ExitCode;

use agentflow::catalog::predefined_agents;
use agentflow::cli::{
    backend_gateway, list_remote, load_config, load_workflow, parse_args, run_remote, serve_local,
    RUN_POLL_INTERVAL,
};
use agentflow::graph::{execution_order, validate};
use agentflow::logs::{init_logging, LogOptions};
use agentflow::models::execution::ExecutionStatus;
use agentflow::utils::version_info;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{error, info};

const USAGE: &str = "usage: agentflow [--version] [--catalog] [--validate=<file>] [--order=<file>] \
[--serve [--port=<port>]] [--list] [--run=<workflow id> [--input=<text>]] [--home=<dir>] [--backend=<url>]";

#[tokio::main]
async fn main() -> ExitCode {
    let cli_args = parse_args(env::args());

    let result = if cli_args.contains_key("version") {
        print_json(&version_info())
    } else if cli_args.contains_key("catalog") {
        print_json(&predefined_agents())
    } else if let Some(path) = cli_args.get("validate") {
        validate_file(path).await
    } else if let Some(path) = cli_args.get("order") {
        print_order(path).await
    } else if cli_args.contains_key("list") {
        list_workflows(&cli_args).await
    } else if let Some(workflow_id) = cli_args.get("run") {
        run_workflow(&cli_args, workflow_id).await
    } else if cli_args.contains_key("serve") {
        run_server(&cli_args).await
    } else {
        eprintln!("{}", USAGE);
        return ExitCode::FAILURE;
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<ExitCode> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(ExitCode::SUCCESS)
}

async fn validate_file(path: &str) -> Result<ExitCode> {
    let workflow = load_workflow(path).await?;

    let issues = validate(&workflow);
    if issues.is_empty() {
        println!("{}: ok", workflow.name);
        return Ok(ExitCode::SUCCESS);
    }
    for issue in &issues {
        println!("{}: {}", workflow.name, issue);
    }
    Ok(ExitCode::FAILURE)
}

async fn print_order(path: &str) -> Result<ExitCode> {
    let workflow = load_workflow(path).await?;
    print_json(&execution_order(&workflow.nodes, &workflow.edges))
}

async fn list_workflows(cli_args: &HashMap<String, String>) -> Result<ExitCode> {
    let (_, settings) = load_config(cli_args).await?;
    let gateway = backend_gateway(&settings)?;
    print_json(&list_remote(&gateway).await?)
}

async fn run_workflow(cli_args: &HashMap<String, String>, workflow_id: &str) -> Result<ExitCode> {
    let (_, settings) = load_config(cli_args).await?;
    let gateway = backend_gateway(&settings)?;
    let input = cli_args.get("input").map(String::as_str).unwrap_or_default();

    // Poll for as long as one request may take
    let attempts = (settings.backend.timeout_secs * 1000 / RUN_POLL_INTERVAL.as_millis() as u64).max(1);
    let execution = run_remote(
        &gateway,
        workflow_id,
        input,
        RUN_POLL_INTERVAL,
        u32::try_from(attempts).unwrap_or(u32::MAX),
    )
    .await?;

    print_json(&execution)?;
    Ok(match execution.status {
        ExecutionStatus::Completed => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

async fn run_server(cli_args: &HashMap<String, String>) -> Result<ExitCode> {
    let (layout, settings) = load_config(cli_args).await?;

    layout
        .setup()
        .await
        .with_context(|| format!("Unable to create {}", layout.base_dir.display()))?;

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        log_dir: Some(layout.logs_dir().path().to_path_buf()),
        ..Default::default()
    };
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            println!("Failed to initialize logging: {e}");
            None
        }
    };

    serve_local(&layout, &settings, await_shutdown_signal()).await?;
    info!("Server stopped");
    Ok(ExitCode::SUCCESS)
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let (mut sigterm, mut sigint) = match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
            _ => {
                error!("Unable to install signal handlers, waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received, shutting down...");
            }
            _ = sigint.recv() => {
                info!("SIGINT received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Ctrl+C received, shutting down...");
    }
}
