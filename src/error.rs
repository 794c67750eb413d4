use std::time::Duration;

use thiserror::Error;

/// Startup configuration problems. Fatal: the agent never starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not set. Export it or put it in a .env file")]
    MissingApiKey { var: &'static str },
}

/// Failures of a single browser action.
///
/// These never abort a task; tool dispatch renders them as text for the LLM.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("failed to launch browser: {0:#}")]
    Launch(#[source] anyhow::Error),

    #[error("failed to load page {url}: {source:#}")]
    Navigation {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("no element matched selector {selector} within {}s", .timeout.as_secs())]
    ElementNotFound { selector: String, timeout: Duration },

    #[error("failed to {action} element {selector}: {source:#}")]
    Action {
        action: &'static str,
        selector: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to read {what}: {source:#}")]
    Read {
        what: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("script evaluation failed: {0:#}")]
    Script(#[source] anyhow::Error),

    #[error("browser session is closed")]
    SessionClosed,
}

/// Argument validation failures at the tool dispatch boundary.
#[derive(Debug, Error)]
pub enum ToolArgsError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Terminal failures of a task.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("LLM request failed: {0:#}")]
    Llm(#[source] anyhow::Error),

    #[error(
        "iteration budget exceeded: no result after {max} iterations; the task may be too complex or need more information"
    )]
    IterationBudgetExceeded { max: usize },
}
