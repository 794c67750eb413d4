use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use headless_chrome::util::Timeout;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::BrowserConfig;
use crate::dom::{self, RawElement};

/// Returned by a driver once its session has been closed.
#[derive(Debug, Error)]
#[error("browser session is closed")]
pub struct ClosedSession;

/// Low-level operations on the single active page.
///
/// Implementations are blocking; callers run them off the async runtime.
pub trait PageDriver: Send + Sync {
    /// Load `url` and wait for the load event, giving up after `timeout`.
    fn navigate(&self, url: &str, timeout: Duration) -> Result<()>;
    fn html(&self) -> Result<String>;
    fn body_text(&self) -> Result<String>;
    fn url(&self) -> Result<String>;
    fn title(&self) -> Result<String>;
    /// Block until `selector` matches at least one element.
    ///
    /// `Ok(false)` means the deadline passed. Errors are reserved for a
    /// broken session or an invalid selector.
    fn wait_for(&self, selector: &str, timeout: Duration) -> Result<bool>;
    fn click(&self, selector: &str) -> Result<()>;
    fn type_into(&self, selector: &str, text: &str) -> Result<()>;
    /// Every current match of `selector`, in DOM order.
    fn query_all(&self, selector: &str) -> Result<Vec<RawElement>>;
    fn evaluate(&self, script: &str) -> Result<Value>;
    /// Release the page, then the browser process. Must be idempotent.
    fn close(&self);
}

/// Headless Chrome session: one browser process, one tab.
pub struct ChromeDriver {
    browser: Mutex<Option<Browser>>,
    tab: Mutex<Option<Arc<Tab>>>,
}

impl ChromeDriver {
    pub fn launch(config: &BrowserConfig) -> Result<Self> {
        let options = LaunchOptions {
            headless: config.headless,
            sandbox: false,
            args: vec![
                std::ffi::OsStr::new("--no-first-run"),
                std::ffi::OsStr::new("--no-default-browser-check"),
            ],
            // LLM round trips leave the connection idle between actions.
            idle_browser_timeout: Duration::from_secs(600),
            ..Default::default()
        };

        info!(headless = config.headless, "launching Chrome");
        let browser = Browser::new(options).context("Chrome did not start")?;
        let tab = browser.new_tab().context("could not open a tab")?;
        tab.navigate_to("about:blank")?;
        info!("Chrome ready");

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            tab: Mutex::new(Some(tab)),
        })
    }

    fn tab(&self) -> Result<Arc<Tab>> {
        self.tab
            .lock()
            .map_err(|_| anyhow!("browser session lock poisoned"))?
            .clone()
            .ok_or_else(|| ClosedSession.into())
    }

    fn evaluate_string(&self, script: &str) -> Result<String> {
        let result = self.tab()?.evaluate(script, false)?;
        Ok(result
            .value
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_default())
    }
}

impl PageDriver for ChromeDriver {
    fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        let tab = self.tab()?;
        tab.set_default_timeout(timeout);
        tab.navigate_to(url)?;
        tab.wait_until_navigated()?;
        Ok(())
    }

    fn html(&self) -> Result<String> {
        self.tab()?.get_content()
    }

    fn body_text(&self) -> Result<String> {
        self.evaluate_string(dom::BODY_TEXT_JS)
    }

    fn url(&self) -> Result<String> {
        Ok(self.tab()?.get_url())
    }

    fn title(&self) -> Result<String> {
        self.tab()?.get_title()
    }

    fn wait_for(&self, selector: &str, timeout: Duration) -> Result<bool> {
        let tab = self.tab()?;
        match tab.wait_for_element_with_custom_timeout(selector, timeout) {
            Ok(_) => Ok(true),
            Err(e) if e.downcast_ref::<Timeout>().is_some() => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn click(&self, selector: &str) -> Result<()> {
        let tab = self.tab()?;
        tab.find_element(selector)?.click()?;
        Ok(())
    }

    fn type_into(&self, selector: &str, text: &str) -> Result<()> {
        let tab = self.tab()?;
        tab.find_element(selector)?.type_into(text)?;
        Ok(())
    }

    fn query_all(&self, selector: &str) -> Result<Vec<RawElement>> {
        let json = self.evaluate_string(&dom::query_elements_js(selector))?;
        if json.is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&json).context("unexpected element listing from page")
    }

    fn evaluate(&self, script: &str) -> Result<Value> {
        let result = self.tab()?.evaluate(script, true)?;
        Ok(result.value.unwrap_or(Value::Null))
    }

    fn close(&self) {
        if let Some(tab) = self.tab.lock().ok().and_then(|mut t| t.take()) {
            if let Err(e) = tab.close(true) {
                warn!("failed to close tab: {e:#}");
            }
        }
        if let Some(browser) = self.browser.lock().ok().and_then(|mut b| b.take()) {
            drop(browser);
            debug!("Chrome process released");
        }
    }
}

impl Drop for ChromeDriver {
    fn drop(&mut self) {
        self.close();
    }
}
