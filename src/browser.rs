//! Browser action layer: timeout-bounded page operations over the single
//! active session, with URL normalization and post-action settle delays.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info};

use crate::config::BrowserConfig;
use crate::dom;
use crate::error::BrowserError;
use crate::hands::{ChromeDriver, ClosedSession, PageDriver};
use crate::types::ElementInfo;

/// Handle to the session. Cloning shares the same page.
#[derive(Clone)]
pub struct BrowserManager {
    driver: Arc<dyn PageDriver>,
    config: BrowserConfig,
}

impl BrowserManager {
    pub fn new(driver: Arc<dyn PageDriver>, config: BrowserConfig) -> Self {
        Self { driver, config }
    }

    /// Start a headless Chrome and wrap it. Blocking.
    pub fn launch(config: BrowserConfig) -> Result<Self, BrowserError> {
        let driver = ChromeDriver::launch(&config).map_err(BrowserError::Launch)?;
        Ok(Self::new(Arc::new(driver), config))
    }

    /// Open `url`, defaulting to https. Returns the URL actually loaded.
    pub fn navigate(&self, url: &str) -> Result<String, BrowserError> {
        let url = normalize_url(url);
        info!(%url, "navigating");
        self.driver
            .navigate(&url, self.config.navigation_timeout)
            .map_err(|source| {
                if is_closed(&source) {
                    BrowserError::SessionClosed
                } else {
                    BrowserError::Navigation {
                        url: url.clone(),
                        source,
                    }
                }
            })?;
        settle(self.config.navigation_settle);
        Ok(url)
    }

    pub fn page_content(&self) -> Result<String, BrowserError> {
        self.driver
            .html()
            .map_err(|source| read_error("page HTML", source))
    }

    pub fn page_text(&self) -> Result<String, BrowserError> {
        self.driver
            .body_text()
            .map_err(|source| read_error("page text", source))
    }

    pub fn page_url(&self) -> Result<String, BrowserError> {
        self.driver
            .url()
            .map_err(|source| read_error("page URL", source))
    }

    pub fn page_title(&self) -> Result<String, BrowserError> {
        self.driver
            .title()
            .map_err(|source| read_error("page title", source))
    }

    pub fn click_element(&self, selector: &str) -> Result<(), BrowserError> {
        self.resolve(selector, self.config.element_timeout)?;
        self.driver
            .click(selector)
            .map_err(|source| action_error("click", selector, source))?;
        debug!(selector, "clicked");
        settle(self.config.click_settle);
        Ok(())
    }

    /// Type `text` into the element. Existing content is not cleared first.
    pub fn fill_input(&self, selector: &str, text: &str) -> Result<(), BrowserError> {
        self.resolve(selector, self.config.element_timeout)?;
        self.driver
            .type_into(selector, text)
            .map_err(|source| action_error("fill", selector, source))
    }

    /// All matches of `selector` with synthesized selectors, in DOM order.
    ///
    /// Nothing appearing within the element timeout yields an empty list.
    pub fn get_elements(&self, selector: &str) -> Result<Vec<ElementInfo>, BrowserError> {
        match self.resolve(selector, self.config.element_timeout) {
            Ok(()) => {}
            Err(BrowserError::ElementNotFound { .. }) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        }
        let raw = self
            .driver
            .query_all(selector)
            .map_err(|source| read_error("elements", source))?;
        Ok(dom::describe_elements(raw, selector))
    }

    /// Wait for `selector` to exist. Visibility is not checked.
    pub fn wait_for_element(&self, selector: &str, timeout: Duration) -> Result<(), BrowserError> {
        self.resolve(selector, timeout)
    }

    /// Run JavaScript in the page and return its value.
    pub fn execute_script(&self, script: &str) -> Result<Value, BrowserError> {
        self.driver.evaluate(script).map_err(|source| {
            if is_closed(&source) {
                BrowserError::SessionClosed
            } else {
                BrowserError::Script(source)
            }
        })
    }

    /// Release the page and the browser process. Safe to call repeatedly.
    pub fn close(&self) {
        self.driver.close();
        info!("browser session closed");
    }

    /// Wait for `selector`. Only a passed deadline is `ElementNotFound`.
    fn resolve(&self, selector: &str, timeout: Duration) -> Result<(), BrowserError> {
        match self.driver.wait_for(selector, timeout) {
            Ok(true) => Ok(()),
            Ok(false) => {
                debug!(selector, "element lookup timed out");
                Err(BrowserError::ElementNotFound {
                    selector: selector.to_string(),
                    timeout,
                })
            }
            Err(source) => Err(action_error("locate", selector, source)),
        }
    }
}

fn is_closed(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ClosedSession>().is_some()
}

fn read_error(what: &'static str, source: anyhow::Error) -> BrowserError {
    if is_closed(&source) {
        BrowserError::SessionClosed
    } else {
        BrowserError::Read { what, source }
    }
}

fn action_error(action: &'static str, selector: &str, source: anyhow::Error) -> BrowserError {
    if is_closed(&source) {
        BrowserError::SessionClosed
    } else {
        BrowserError::Action {
            action,
            selector: selector.to_string(),
            source,
        }
    }
}

/// Prefix `https://` unless the URL already names http or https.
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

fn settle(delay: Duration) {
    if !delay.is_zero() {
        std::thread::sleep(delay);
    }
}
