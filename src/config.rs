use std::time::Duration;

use crate::error::ConfigError;
use crate::types::MAX_ITERATIONS_PER_TASK;

pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const DEFAULT_MODEL: &str = "gpt-4-turbo-preview";
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

pub const SYSTEM_PROMPT: &str = r#"You are a browser automation agent. You control a real headless Chrome browser through the tools you are given.

How to work:
1. Use navigate to open a page. A bare domain such as "example.com" is fine.
2. Use get_page_info for the URL and title, get_page_content for the HTML and visible text.
3. Use get_elements to discover elements. Each result carries a selector you can pass to click_element or fill_input.
4. Selectors ending in :nth-child(...) are positional. Re-run get_elements after any navigation or click before reusing them.
5. Use wait_for_element when content loads late.
6. If a tool returns an error, read it and try a different approach or selector.
7. When the task is done, call complete_task with a concise result. If you cannot finish, call complete_task and explain why.
8. Keep steps minimal. Do not over-navigate."#;

/// Behaviour of the agent loop.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub model: String,
    pub temperature: f64,
    pub max_iterations: usize,
    pub system_prompt: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_iterations: MAX_ITERATIONS_PER_TASK,
            system_prompt: SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Timeouts and settle delays of the browser action layer.
///
/// The settle delays stand in for a real "page is quiet" signal.
#[derive(Debug, Clone, Copy)]
pub struct BrowserConfig {
    pub headless: bool,
    pub navigation_timeout: Duration,
    pub element_timeout: Duration,
    pub navigation_settle: Duration,
    pub click_settle: Duration,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            navigation_timeout: Duration::from_secs(30),
            element_timeout: Duration::from_secs(10),
            navigation_settle: Duration::from_secs(2),
            click_settle: Duration::from_secs(1),
        }
    }
}

/// Read the LLM credential from the environment.
pub fn api_key_from_env() -> Result<String, ConfigError> {
    api_key_from(std::env::var(API_KEY_VAR).ok())
}

fn api_key_from(value: Option<String>) -> Result<String, ConfigError> {
    match value {
        Some(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(ConfigError::MissingApiKey { var: API_KEY_VAR }),
    }
}
