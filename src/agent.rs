use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::brain::{ChatRequest, LlmClient};
use crate::browser::BrowserManager;
use crate::config::AgentConfig;
use crate::dispatch::{self, ToolOutcome, format_error, truncate};
use crate::error::AgentError;
use crate::tools::{Tool, browser_tools};
use crate::types::{ChatMessage, ToolCallRequest, ToolResult};

const LOG_PREVIEW_CHARS: usize = 200;

/// Drives one task at a time: LLM call, tool dispatch, repeat.
///
/// The transcript carries over between tasks until `clear_history`.
pub struct Agent {
    llm: Arc<dyn LlmClient>,
    browser: BrowserManager,
    tools: Vec<Tool>,
    config: AgentConfig,
    conversation: Vec<ChatMessage>,
}

impl Agent {
    pub fn new(llm: Arc<dyn LlmClient>, browser: BrowserManager, config: AgentConfig) -> Self {
        let conversation = vec![ChatMessage::system(config.system_prompt.clone())];
        Self {
            llm,
            browser,
            tools: browser_tools(),
            config,
            conversation,
        }
    }

    /// Run `task` until the model answers, calls `complete_task`, or the
    /// iteration budget runs out.
    pub async fn execute_task(&mut self, task: &str) -> Result<String, AgentError> {
        info!(task, "starting task");
        self.conversation.push(ChatMessage::user(task));

        let max = self.config.max_iterations;
        for iteration in 1..=max {
            info!(iteration, max, "asking the LLM for the next step");

            let reply = self
                .llm
                .complete(ChatRequest {
                    model: &self.config.model,
                    messages: &self.conversation,
                    tools: &self.tools,
                    temperature: self.config.temperature,
                })
                .await
                .map_err(AgentError::Llm)?;
            self.conversation.push(reply.clone());

            if reply.tool_calls.is_empty() {
                if reply.text_content().is_empty() {
                    debug!(iteration, "empty reply without tool calls; continuing");
                    continue;
                }
                info!("task answered without tool calls");
                return Ok(reply.text_content().to_string());
            }

            let mut calls = reply.tool_calls.iter();
            while let Some(call) = calls.next() {
                info!(tool = %call.name, id = %call.id, "calling tool");
                let outcome = self.dispatch(call).await;
                debug!(
                    result = %truncate(&outcome.result.content, LOG_PREVIEW_CHARS),
                    "tool finished"
                );
                self.conversation.push(ChatMessage::tool(outcome.result));

                if let Some(result) = outcome.completion {
                    self.skip_remaining(calls);
                    info!("task completed");
                    return Ok(result);
                }
            }
        }

        warn!(max, "iteration budget exceeded");
        Err(AgentError::IterationBudgetExceeded { max })
    }

    /// The full ordered transcript, system turn first.
    pub fn history(&self) -> &[ChatMessage] {
        &self.conversation
    }

    /// Drop everything but the system turn. The browser session is kept.
    pub fn clear_history(&mut self) {
        self.conversation.truncate(1);
    }

    async fn dispatch(&self, call: &ToolCallRequest) -> ToolOutcome {
        let browser = self.browser.clone();
        let owned = call.clone();
        // Browser actions block on the driver and sleep while pages settle.
        match tokio::task::spawn_blocking(move || dispatch::execute_tool(&browser, &owned)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let message = format_error(format!("tool {} crashed: {e}", call.name));
                ToolOutcome {
                    result: ToolResult::new(&call.id, message),
                    completion: None,
                }
            }
        }
    }

    /// Answer calls left in the batch after `complete_task` without running
    /// them, so the transcript stays a valid history for the next task.
    fn skip_remaining<'a>(&mut self, calls: impl Iterator<Item = &'a ToolCallRequest>) {
        for call in calls {
            debug!(tool = %call.name, id = %call.id, "skipping call after complete_task");
            self.conversation.push(ChatMessage::tool(ToolResult::new(
                &call.id,
                "Skipped: the task was already completed",
            )));
        }
    }
}
