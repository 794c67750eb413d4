use serde::Deserialize;

use crate::types::ElementInfo;

/// Element metadata as read straight from the page, before a stable
/// selector is synthesized for it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawElement {
    pub tag: String,
    #[serde(default)]
    pub text: String,
    pub href: Option<String>,
    pub id: Option<String>,
    pub class_name: Option<String>,
    pub data_id: Option<String>,
    #[serde(default)]
    pub visible: bool,
}

/// Build a locator for the element at `index` among the matches of `query`.
///
/// `#id` wins, then `[data-id='...']`, then `query:nth-child(index + 1)`.
/// The positional form only holds for the DOM state it was computed on.
pub fn synthesize_selector(element: &RawElement, query: &str, index: usize) -> String {
    if let Some(id) = non_empty(&element.id) {
        return format!("#{id}");
    }
    if let Some(data_id) = non_empty(&element.data_id) {
        return format!("[data-id='{data_id}']");
    }
    format!("{query}:nth-child({})", index + 1)
}

/// Turn the raw matches of `query` into `ElementInfo`s, in DOM order.
pub fn describe_elements(raw: Vec<RawElement>, query: &str) -> Vec<ElementInfo> {
    raw.into_iter()
        .enumerate()
        .map(|(index, element)| ElementInfo {
            selector: synthesize_selector(&element, query, index),
            tag: element.tag.to_lowercase(),
            text: element.text.trim().to_string(),
            href: element.href,
            id: element.id,
            class: element.class_name,
            visible: element.visible,
            index,
        })
        .collect()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// JavaScript that serializes every match of `selector` to a JSON string.
///
/// The selector is embedded as a JSON string literal so quotes in it
/// cannot break out of the script.
pub fn query_elements_js(selector: &str) -> String {
    let literal = serde_json::to_string(selector).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        r#"(() => {{
  const out = [];
  for (const el of document.querySelectorAll({literal})) {{
    const rect = el.getBoundingClientRect();
    const style = window.getComputedStyle(el);
    out.push({{
      tag: el.tagName.toLowerCase(),
      text: el.innerText || el.textContent || '',
      href: el.getAttribute('href'),
      id: el.getAttribute('id'),
      className: el.getAttribute('class'),
      dataId: el.getAttribute('data-id'),
      visible: rect.width > 0 && rect.height > 0 &&
        style.visibility !== 'hidden' && style.display !== 'none'
    }});
  }}
  return JSON.stringify(out);
}})()"#
    )
}

pub const BODY_TEXT_JS: &str = "document.body ? document.body.innerText : ''";
