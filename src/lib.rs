//! An LLM-driven agent that carries out natural-language tasks in a
//! headless browser, one tool call at a time.

pub mod agent;
pub mod brain;
pub mod browser;
pub mod config;
pub mod dispatch;
pub mod dom;
pub mod error;
pub mod hands;
pub mod tools;
pub mod types;

pub use agent::Agent;
pub use brain::{ChatRequest, LlmClient, OpenAiBrain};
pub use browser::BrowserManager;
pub use config::{AgentConfig, BrowserConfig};
pub use error::{AgentError, BrowserError, ConfigError, ToolArgsError};
pub use hands::{ChromeDriver, PageDriver};
pub use types::{ChatMessage, ElementInfo, Role, ToolCallRequest, ToolResult};
