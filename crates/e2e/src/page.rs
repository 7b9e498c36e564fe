//! One browser tab, shared by every page object of a test

use std::sync::Arc;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::Timeouts;
use crate::driver::{Command, Transport};
use crate::error::{E2eError, E2eResult};
use crate::locator::{AriaRole, Locator, Query, Step, TYPE_DELAY_MS};

/// Cloneable handle to a browser session; clones share the session
#[derive(Clone)]
pub struct Page {
    transport: Arc<dyn Transport>,
    timeouts: Timeouts,
}

impl Page {
    pub fn new(transport: Arc<dyn Transport>, timeouts: Timeouts) -> Self {
        Self { transport, timeouts }
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    pub(crate) async fn call(&self, command: Command) -> E2eResult<Value> {
        self.transport.call(command).await
    }

    pub async fn goto(&self, url: &str) -> E2eResult<()> {
        info!("Navigating to {}", url);
        self.call(Command::Goto {
            url: url.to_string(),
            timeout_ms: self.timeouts.navigation_ms,
        })
        .await?;
        Ok(())
    }

    /// Wait until the page URL matches `pattern` (a regex) and return the URL
    pub async fn wait_for_url(&self, pattern: &str) -> E2eResult<String> {
        Regex::new(pattern)?;
        let value = self
            .call(Command::WaitForUrl {
                pattern: pattern.to_string(),
                timeout_ms: self.timeouts.navigation_ms,
            })
            .await?;
        let url = value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| E2eError::Protocol(format!("wait_for_url replied {}", value)))?;
        debug!("URL matched /{}/: {}", pattern, url);
        Ok(url)
    }

    /// Type into whatever element currently has focus, one key at a time
    pub async fn keyboard_type(&self, text: &str) -> E2eResult<()> {
        self.call(Command::KeyboardType {
            text: text.to_string(),
            delay_ms: TYPE_DELAY_MS,
        })
        .await?;
        Ok(())
    }

    pub fn locator(&self, selector: &str) -> Locator {
        self.root(Step::Css { selector: selector.to_string() })
    }

    pub fn get_by_role(&self, role: AriaRole, name: &str) -> Locator {
        self.root(Step::Role {
            role,
            name: Some(name.to_string()),
            exact: false,
        })
    }

    pub fn get_by_placeholder(&self, text: &str) -> Locator {
        self.root(Step::Placeholder { text: text.to_string() })
    }

    pub fn get_by_text(&self, text: &str) -> Locator {
        self.root(Step::Text {
            text: text.to_string(),
            exact: false,
        })
    }

    fn root(&self, step: Step) -> Locator {
        Locator::new(self.clone(), Query::new(step))
    }

    /// Close the browser and stop the driver
    pub async fn close(&self) -> E2eResult<()> {
        self.transport.shutdown().await
    }
}
