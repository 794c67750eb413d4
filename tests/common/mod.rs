#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use browser_agent::dom::RawElement;
use browser_agent::hands::ClosedSession;
use browser_agent::{
    AgentConfig, BrowserConfig, BrowserManager, ChatMessage, ChatRequest, LlmClient, PageDriver,
    ToolCallRequest,
};
use serde_json::{Value, json};

/// Page driver that serves canned page state and records every call.
#[derive(Default)]
pub struct StubDriver {
    title: String,
    html: String,
    text: String,
    elements: HashMap<String, Vec<RawElement>>,
    fail_navigation: bool,
    lost_connection: bool,
    closed: AtomicBool,
    url: Mutex<String>,
    calls: Mutex<Vec<String>>,
}

impl StubDriver {
    pub fn with_title(title: &str) -> Self {
        Self {
            title: title.to_string(),
            url: Mutex::new("about:blank".to_string()),
            ..Default::default()
        }
    }

    pub fn with_elements(mut self, selector: &str, elements: Vec<RawElement>) -> Self {
        self.elements.insert(selector.to_string(), elements);
        self
    }

    pub fn with_page(mut self, html: &str, text: &str) -> Self {
        self.html = html.to_string();
        self.text = text.to_string();
        self
    }

    pub fn failing_navigation(mut self) -> Self {
        self.fail_navigation = true;
        self
    }

    /// Every lookup fails the way a dropped DevTools connection does.
    pub fn lost_connection(mut self) -> Self {
        self.lost_connection = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ClosedSession.into());
        }
        Ok(())
    }

    fn matches(&self, selector: &str) -> bool {
        self.elements.get(selector).is_some_and(|els| !els.is_empty())
    }
}

impl PageDriver for StubDriver {
    fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        self.ensure_open()?;
        self.record(format!("navigate {url} {}s", timeout.as_secs()));
        if self.fail_navigation {
            bail!("net::ERR_NAME_NOT_RESOLVED");
        }
        *self.url.lock().unwrap() = url.to_string();
        Ok(())
    }

    fn html(&self) -> Result<String> {
        self.ensure_open()?;
        Ok(self.html.clone())
    }

    fn body_text(&self) -> Result<String> {
        self.ensure_open()?;
        Ok(self.text.clone())
    }

    fn url(&self) -> Result<String> {
        self.ensure_open()?;
        Ok(self.url.lock().unwrap().clone())
    }

    fn title(&self) -> Result<String> {
        self.ensure_open()?;
        Ok(self.title.clone())
    }

    fn wait_for(&self, selector: &str, timeout: Duration) -> Result<bool> {
        self.ensure_open()?;
        self.record(format!("wait {selector} {}s", timeout.as_secs()));
        if self.lost_connection {
            bail!("Unable to make method calls because underlying connection is closed");
        }
        Ok(self.matches(selector))
    }

    fn click(&self, selector: &str) -> Result<()> {
        self.ensure_open()?;
        self.record(format!("click {selector}"));
        Ok(())
    }

    fn type_into(&self, selector: &str, text: &str) -> Result<()> {
        self.ensure_open()?;
        self.record(format!("type {selector} {text}"));
        Ok(())
    }

    fn query_all(&self, selector: &str) -> Result<Vec<RawElement>> {
        self.ensure_open()?;
        Ok(self.elements.get(selector).cloned().unwrap_or_default())
    }

    fn evaluate(&self, script: &str) -> Result<Value> {
        self.ensure_open()?;
        self.record(format!("eval {script}"));
        Ok(json!(42))
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.record("close".to_string());
    }
}

/// Browser config with the real timeouts but no settle delays.
pub fn fast_config() -> BrowserConfig {
    BrowserConfig {
        navigation_settle: Duration::ZERO,
        click_settle: Duration::ZERO,
        ..BrowserConfig::default()
    }
}

pub fn browser_with(driver: Arc<StubDriver>) -> BrowserManager {
    BrowserManager::new(driver, fast_config())
}

/// LLM that plays back a fixed script of assistant turns.
#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<ChatMessage>>,
    repeat: Option<ChatMessage>,
    fail: bool,
    calls: AtomicUsize,
    seen: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<ChatMessage>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Default::default()
        }
    }

    /// Answers every request with `reply`, forever.
    pub fn repeating(reply: ChatMessage) -> Self {
        Self {
            repeat: Some(reply),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Transcripts received, one per call.
    pub fn seen(&self) -> Vec<Vec<ChatMessage>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, request: ChatRequest<'_>) -> Result<ChatMessage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(request.messages.to_vec());
        assert_eq!(request.tools.len(), 8);
        assert_eq!(request.temperature, 0.7);

        if self.fail {
            bail!("connection refused");
        }
        if let Some(reply) = self.replies.lock().unwrap().pop_front() {
            return Ok(reply);
        }
        self.repeat
            .clone()
            .ok_or_else(|| anyhow!("script exhausted"))
    }
}

pub fn tool_reply(calls: &[(&str, &str, &str)]) -> ChatMessage {
    ChatMessage::assistant(
        None,
        calls
            .iter()
            .map(|(id, name, args)| ToolCallRequest::new(*id, *name, *args))
            .collect(),
    )
}

pub fn text_reply(text: &str) -> ChatMessage {
    ChatMessage::assistant(Some(text.to_string()), Vec::new())
}

pub fn config_with_budget(max_iterations: usize) -> AgentConfig {
    AgentConfig {
        max_iterations,
        ..AgentConfig::default()
    }
}
