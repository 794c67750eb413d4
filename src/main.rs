use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use browser_agent::config::{self, AgentConfig, BrowserConfig};
use browser_agent::{Agent, BrowserManager, OpenAiBrain};
use clap::Parser;
use dotenvy::dotenv;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Give an AI agent tasks to carry out in a headless browser.
///
/// Reads one task per line from standard input. Type `quit` or `exit` to stop.
/// Requires OPENAI_API_KEY in the environment or a .env file.
#[derive(Parser)]
#[command(version, about)]
struct Cli {}

#[tokio::main]
async fn main() -> Result<()> {
    Cli::parse();
    dotenv().ok();
    init_logging();

    let api_key = config::api_key_from_env()?;

    println!("AI Browser Agent started.");
    println!("Enter a task for the agent (or 'quit' to exit).");

    let browser_config = BrowserConfig::default();
    let browser = tokio::task::spawn_blocking(move || BrowserManager::launch(browser_config))
        .await
        .context("browser launch panicked")?
        .context("failed to start the browser")?;

    let brain = Arc::new(OpenAiBrain::new(api_key, None));
    let mut agent = Agent::new(brain, browser.clone(), AgentConfig::default());
    info!("agent ready");

    let outcome = repl(&mut agent).await;

    let closing = browser.clone();
    tokio::task::spawn_blocking(move || closing.close()).await.ok();
    outcome
}

async fn repl(agent: &mut Agent) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("\nYour task: ");
        std::io::stdout().flush().ok();

        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                println!("Failed to read input: {e}");
                break;
            }
        };

        let task = line.trim();
        if task.is_empty() {
            continue;
        }
        if task.eq_ignore_ascii_case("quit") || task.eq_ignore_ascii_case("exit") {
            println!("Goodbye!");
            break;
        }

        println!("\nAgent is working on: {task}\n");
        match agent.execute_task(task).await {
            Ok(result) => println!("\nResult: {result}"),
            Err(e) => println!("Task failed: {e}"),
        }
    }

    Ok(())
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
