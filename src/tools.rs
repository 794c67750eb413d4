//! The fixed tool catalog offered to the LLM, and typed parsing of the
//! argument payloads it sends back.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ToolArgsError;
use crate::types::DEFAULT_WAIT_TIMEOUT_SECS;

pub const COMPLETE_TASK: &str = "complete_task";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterSpec {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: ParamType,
    pub description: &'static str,
    pub required: bool,
}

/// A callable action exposed to the LLM.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tool {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Vec<ParameterSpec>,
}

impl Tool {
    fn new(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            parameters: Vec::new(),
        }
    }

    fn param(mut self, name: &'static str, kind: ParamType, description: &'static str) -> Self {
        self.parameters.push(ParameterSpec {
            name,
            kind,
            description,
            required: true,
        });
        self
    }

    fn optional(mut self, name: &'static str, kind: ParamType, description: &'static str) -> Self {
        self.parameters.push(ParameterSpec {
            name,
            kind,
            description,
            required: false,
        });
        self
    }

    /// JSON schema of the arguments object, as sent to the LLM.
    pub fn parameters_schema(&self) -> Value {
        let properties: serde_json::Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| {
                (
                    p.name.to_string(),
                    json!({ "type": p.kind, "description": p.description }),
                )
            })
            .collect();
        let required: Vec<&str> = self
            .parameters
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// The eight browser tools, in the order they are offered.
pub fn browser_tools() -> Vec<Tool> {
    vec![
        Tool::new("navigate", "Open the given URL in the browser")
            .param("url", ParamType::String, "URL of the page to open"),
        Tool::new(
            "get_page_content",
            "Get the HTML and the visible text of the current page",
        ),
        Tool::new("get_page_info", "Get the URL and title of the current page"),
        Tool::new("click_element", "Click an element on the page by CSS selector")
            .param("selector", ParamType::String, "CSS selector of the element"),
        Tool::new("fill_input", "Type text into an input field")
            .param("selector", ParamType::String, "CSS selector of the input field")
            .param("text", ParamType::String, "Text to type"),
        Tool::new(
            "get_elements",
            "List the elements matching a CSS selector, with a stable selector for each",
        )
        .param("selector", ParamType::String, "CSS selector to search for"),
        Tool::new("wait_for_element", "Wait until an element appears on the page")
            .param("selector", ParamType::String, "CSS selector of the element")
            .optional("timeout", ParamType::Integer, "How long to wait, in seconds (default 10)"),
        Tool::new(COMPLETE_TASK, "Finish the task and report the result")
            .param("result", ParamType::String, "Result of the task"),
    ]
}

/// A tool call with its arguments validated.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "name", content = "arguments", rename_all = "snake_case")]
pub enum ToolInvocation {
    Navigate { url: String },
    GetPageContent {},
    GetPageInfo {},
    ClickElement { selector: String },
    FillInput { selector: String, text: String },
    GetElements { selector: String },
    WaitForElement {
        selector: String,
        #[serde(default)]
        timeout: Option<i64>,
    },
    CompleteTask { result: String },
}

impl ToolInvocation {
    /// Validate `raw_arguments` against the shape of tool `name`.
    ///
    /// An empty payload is read as `{}` so argument-less tools accept it.
    pub fn parse(name: &str, raw_arguments: &str) -> Result<Self, ToolArgsError> {
        if !browser_tools().iter().any(|t| t.name == name) {
            return Err(ToolArgsError::UnknownTool(name.to_string()));
        }
        let invalid = |source| ToolArgsError::InvalidArguments {
            tool: name.to_string(),
            source,
        };

        let raw = raw_arguments.trim();
        let arguments: Value = if raw.is_empty() {
            json!({})
        } else {
            serde_json::from_str(raw).map_err(invalid)?
        };

        serde_json::from_value(json!({ "name": name, "arguments": arguments })).map_err(invalid)
    }
}

/// Timeout for `wait_for_element`; zero, negative or absent means the default.
pub fn wait_timeout(seconds: Option<i64>) -> Duration {
    match seconds {
        Some(secs) if secs > 0 => Duration::from_secs(secs.unsigned_abs()),
        _ => Duration::from_secs(DEFAULT_WAIT_TIMEOUT_SECS),
    }
}
