//! Tool dispatch: one `ToolCallRequest` in, one `ToolResult` out.
//!
//! Nothing fails past this point. Bad arguments, unknown tools and browser
//! errors all become result text the LLM can read and react to.

use std::fmt::Display;
use std::fmt::Write as _;

use crate::browser::BrowserManager;
use crate::tools::{ToolInvocation, wait_timeout};
use crate::types::{
    ELEMENT_TEXT_MAX_CHARS, ElementInfo, MAX_LISTED_ELEMENTS, PAGE_HTML_MAX_CHARS,
    PAGE_TEXT_MAX_CHARS, ToolCallRequest, ToolResult,
};

/// Result of dispatching one call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    pub result: ToolResult,
    /// `Some(result)` when the call was a valid `complete_task`.
    pub completion: Option<String>,
}

pub fn execute_tool(browser: &BrowserManager, call: &ToolCallRequest) -> ToolOutcome {
    let invocation = match ToolInvocation::parse(&call.name, &call.raw_arguments) {
        Ok(invocation) => invocation,
        Err(e) => return outcome(call, format_error(e)),
    };

    let content = match invocation {
        ToolInvocation::Navigate { url } => match browser.navigate(&url) {
            Ok(loaded) => format!("Navigated to {loaded}"),
            Err(e) => format_error(e),
        },
        ToolInvocation::GetPageContent {} => page_content(browser),
        ToolInvocation::GetPageInfo {} => page_info(browser),
        ToolInvocation::ClickElement { selector } => match browser.click_element(&selector) {
            Ok(()) => format!("Clicked element {selector}"),
            Err(e) => format_error(e),
        },
        ToolInvocation::FillInput { selector, text } => {
            match browser.fill_input(&selector, &text) {
                Ok(()) => format!("Filled {selector} with text: {text}"),
                Err(e) => format_error(e),
            }
        }
        ToolInvocation::GetElements { selector } => match browser.get_elements(&selector) {
            Ok(elements) => format_elements(&selector, &elements),
            Err(e) => format_error(e),
        },
        ToolInvocation::WaitForElement { selector, timeout } => {
            match browser.wait_for_element(&selector, wait_timeout(timeout)) {
                Ok(()) => format!("Element {selector} appeared"),
                Err(e) => format_error(e),
            }
        }
        ToolInvocation::CompleteTask { result } => {
            return ToolOutcome {
                result: ToolResult::new(&call.id, format!("Task completed: {result}")),
                completion: Some(result),
            };
        }
    };

    outcome(call, content)
}

fn outcome(call: &ToolCallRequest, content: String) -> ToolOutcome {
    ToolOutcome {
        result: ToolResult::new(&call.id, content),
        completion: None,
    }
}

fn page_content(browser: &BrowserManager) -> String {
    let html = match browser.page_content() {
        Ok(html) => html,
        Err(e) => return format_error(e),
    };
    let text = match browser.page_text() {
        Ok(text) => text,
        Err(e) => return format_error(e),
    };
    format!(
        "HTML (first {PAGE_HTML_MAX_CHARS} chars): {}\n\nPage text (first {PAGE_TEXT_MAX_CHARS} chars): {}",
        truncate(&html, PAGE_HTML_MAX_CHARS),
        truncate(&text, PAGE_TEXT_MAX_CHARS),
    )
}

fn page_info(browser: &BrowserManager) -> String {
    match (browser.page_url(), browser.page_title()) {
        (Ok(url), Ok(title)) => format!("URL: {url}\nTitle: {title}"),
        (Err(e), _) | (_, Err(e)) => format_error(e),
    }
}

/// Summarize at most `MAX_LISTED_ELEMENTS` matches, then count the rest.
pub fn format_elements(selector: &str, elements: &[ElementInfo]) -> String {
    if elements.is_empty() {
        return format!("No elements found for selector '{selector}'");
    }

    let mut info = format!("Found {} elements:\n", elements.len());
    for (i, elem) in elements.iter().take(MAX_LISTED_ELEMENTS).enumerate() {
        let _ = write!(
            info,
            "{}. selector: {}, tag: {}, text: {}",
            i + 1,
            elem.selector,
            elem.tag,
            truncate(&elem.text, ELEMENT_TEXT_MAX_CHARS)
        );
        if let Some(href) = &elem.href {
            let _ = write!(info, ", href: {href}");
        }
        if let Some(id) = &elem.id {
            let _ = write!(info, ", id: {id}");
        }
        if !elem.visible {
            info.push_str(", hidden");
        }
        info.push('\n');
    }
    if elements.len() > MAX_LISTED_ELEMENTS {
        let _ = writeln!(
            info,
            "... and {} more elements",
            elements.len() - MAX_LISTED_ELEMENTS
        );
    }
    info
}

pub fn format_error(err: impl Display) -> String {
    format!("Error: {err}")
}

/// Cut `s` to `max_chars` characters, marking the cut with `...`.
pub fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &s[..byte_idx]),
        None => s.to_string(),
    }
}
