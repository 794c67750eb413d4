mod common;

use std::sync::Arc;
use std::time::Duration;

use browser_agent::BrowserError;
use browser_agent::dispatch::execute_tool;
use browser_agent::dom::RawElement;
use browser_agent::types::ToolCallRequest;
use common::{StubDriver, browser_with};
use serde_json::json;

#[test]
fn navigate_defaults_to_https() {
    let driver = Arc::new(StubDriver::with_title("Example Domain"));
    let browser = browser_with(driver.clone());

    assert_eq!(browser.navigate("example.com").unwrap(), "https://example.com");
    assert_eq!(browser.navigate("http://x").unwrap(), "http://x");
    assert_eq!(
        driver.calls(),
        ["navigate https://example.com 30s", "navigate http://x 30s"]
    );
    assert_eq!(browser.page_url().unwrap(), "http://x");
}

#[test]
fn navigation_failure_names_the_url() {
    let driver = Arc::new(StubDriver::with_title("").failing_navigation());
    let browser = browser_with(driver);

    let err = browser.navigate("nowhere.invalid").unwrap_err();
    assert!(matches!(err, BrowserError::Navigation { ref url, .. } if url == "https://nowhere.invalid"));
    assert!(err.to_string().contains("ERR_NAME_NOT_RESOLVED"));
}

#[test]
fn click_waits_for_the_element_first() {
    let driver = Arc::new(
        StubDriver::with_title("Page").with_elements("button.go", vec![RawElement::default()]),
    );
    let browser = browser_with(driver.clone());

    browser.click_element("button.go").unwrap();
    assert_eq!(driver.calls(), ["wait button.go 10s", "click button.go"]);

    let err = browser.click_element("button.stop").unwrap_err();
    assert!(matches!(
        err,
        BrowserError::ElementNotFound { ref selector, timeout }
            if selector == "button.stop" && timeout == Duration::from_secs(10)
    ));
    assert!(!driver.calls().contains(&"click button.stop".to_string()));
}

#[test]
fn fill_input_types_without_clearing() {
    let driver =
        Arc::new(StubDriver::with_title("Search").with_elements("#q", vec![RawElement::default()]));
    let browser = browser_with(driver.clone());

    browser.fill_input("#q", "headless chrome").unwrap();
    assert_eq!(driver.calls(), ["wait #q 10s", "type #q headless chrome"]);
}

#[test]
fn get_elements_is_empty_when_nothing_appears() {
    let driver = Arc::new(StubDriver::with_title("Empty"));
    let browser = browser_with(driver);

    assert!(browser.get_elements(".result").unwrap().is_empty());
}

#[test]
fn get_elements_synthesizes_stable_selectors() {
    let items = vec![
        RawElement {
            tag: "LI".into(),
            id: Some("first".into()),
            ..Default::default()
        },
        RawElement {
            tag: "LI".into(),
            data_id: Some("sku-2".into()),
            ..Default::default()
        },
        RawElement {
            tag: "LI".into(),
            text: "\n  third  ".into(),
            class_name: Some("item".into()),
            visible: true,
            ..Default::default()
        },
    ];
    let driver = Arc::new(StubDriver::with_title("List").with_elements("ul li", items));
    let browser = browser_with(driver);

    let first = browser.get_elements("ul li").unwrap();
    let second = browser.get_elements("ul li").unwrap();
    assert_eq!(first, second);

    let selectors: Vec<&str> = first.iter().map(|e| e.selector.as_str()).collect();
    assert_eq!(selectors, ["#first", "[data-id='sku-2']", "ul li:nth-child(3)"]);
    assert_eq!(first[2].text, "third");
    assert_eq!(first[2].class.as_deref(), Some("item"));
    assert_eq!(first[2].tag, "li");
    assert_eq!(first[2].index, 2);
}

#[test]
fn wait_for_element_uses_the_given_timeout() {
    let driver = Arc::new(StubDriver::with_title("Page"));
    let browser = browser_with(driver.clone());

    assert!(browser.wait_for_element("#late", Duration::from_secs(3)).is_err());
    assert_eq!(driver.calls(), ["wait #late 3s"]);
}

#[test]
fn execute_script_returns_the_value() {
    let driver = Arc::new(StubDriver::with_title("Page"));
    let browser = browser_with(driver.clone());

    assert_eq!(browser.execute_script("6 * 7").unwrap(), json!(42));
    assert_eq!(driver.calls(), ["eval 6 * 7"]);
}

#[test]
fn close_can_be_called_twice() {
    let driver = Arc::new(StubDriver::with_title("Page"));
    let browser = browser_with(driver.clone());

    browser.close();
    browser.close();
    assert_eq!(driver.calls(), ["close", "close"]);
}

#[test]
fn actions_after_close_report_a_closed_session() {
    let driver =
        Arc::new(StubDriver::with_title("Page").with_elements("#go", vec![RawElement::default()]));
    let browser = browser_with(driver.clone());
    browser.close();

    assert!(matches!(browser.click_element("#go"), Err(BrowserError::SessionClosed)));
    assert!(matches!(
        browser.wait_for_element("#go", Duration::from_secs(1)),
        Err(BrowserError::SessionClosed)
    ));
    assert!(matches!(browser.get_elements("#go"), Err(BrowserError::SessionClosed)));
    assert!(matches!(browser.navigate("example.com"), Err(BrowserError::SessionClosed)));
    assert!(matches!(browser.page_title(), Err(BrowserError::SessionClosed)));
    assert!(matches!(browser.execute_script("1"), Err(BrowserError::SessionClosed)));

    let outcome = execute_tool(
        &browser,
        &ToolCallRequest::new("c1", "click_element", r##"{"selector":"#go"}"##),
    );
    assert_eq!(outcome.result.content, "Error: browser session is closed");
}

#[test]
fn lost_connection_is_not_reported_as_a_missing_element() {
    let driver = Arc::new(
        StubDriver::with_title("Page")
            .with_elements("#go", vec![RawElement::default()])
            .lost_connection(),
    );
    let browser = browser_with(driver.clone());

    let err = browser.click_element("#go").unwrap_err();
    assert!(matches!(err, BrowserError::Action { action: "locate", .. }), "got {err:?}");
    assert!(err.to_string().contains("connection is closed"));
    assert!(browser.get_elements("#go").is_err());
    assert!(!driver.calls().contains(&"click #go".to_string()));
}

#[test]
fn page_content_is_truncated_for_the_llm() {
    let driver = Arc::new(
        StubDriver::with_title("Long").with_page(&"<p>".repeat(2000), &"word ".repeat(1000)),
    );
    let browser = browser_with(driver);

    let outcome = execute_tool(
        &browser,
        &ToolCallRequest::new("c1", "get_page_content", "{}"),
    );
    let content = outcome.result.content;

    assert_eq!(outcome.result.tool_call_id, "c1");
    assert!(outcome.completion.is_none());
    assert!(content.starts_with("HTML (first 5000 chars): <p><p>"));
    let (html_part, text_part) = content.split_once("\n\nPage text (first 3000 chars): ").unwrap();
    assert_eq!(html_part.len(), "HTML (first 5000 chars): ".len() + 5000 + 3);
    assert!(html_part.ends_with("..."));
    assert_eq!(text_part.len(), 3000 + 3);
}

#[test]
fn wait_for_element_tool_defaults_to_ten_seconds() {
    let driver = Arc::new(StubDriver::with_title("Page"));
    let browser = browser_with(driver.clone());

    execute_tool(
        &browser,
        &ToolCallRequest::new("c1", "wait_for_element", r##"{"selector":"#a","timeout":0}"##),
    );
    execute_tool(
        &browser,
        &ToolCallRequest::new("c2", "wait_for_element", r##"{"selector":"#b"}"##),
    );
    let negative = execute_tool(
        &browser,
        &ToolCallRequest::new("c3", "wait_for_element", r##"{"selector":"#c","timeout":-1}"##),
    );
    assert!(!negative.result.content.contains("invalid arguments"));
    assert_eq!(driver.calls(), ["wait #a 10s", "wait #b 10s", "wait #c 10s"]);
}
