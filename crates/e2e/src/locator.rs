//! Lazy, hierarchical element handles
//!
//! A [`Locator`] describes where elements live: an ordered chain of steps,
//! each one scoped to the result of the previous one. Nothing is looked up
//! when a locator is built; the chain is sent to the driver and re-evaluated
//! against the live page every time an action or read runs, so a locator
//! stays valid while cards move and dialogs open and close.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::driver::Command;
use crate::error::{E2eError, E2eResult};
use crate::page::Page;

/// Delay between keystrokes for keystroke-level typing
pub const TYPE_DELAY_MS: u64 = 20;

/// ARIA roles the page objects look elements up by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AriaRole {
    Button,
    Link,
    Heading,
}

impl AriaRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AriaRole::Button => "button",
            AriaRole::Link => "link",
            AriaRole::Heading => "heading",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitState {
    #[default]
    Visible,
    Hidden,
    Attached,
    Detached,
}

/// One link of a locator chain
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    Css {
        selector: String,
    },
    Role {
        role: AriaRole,
        name: Option<String>,
        exact: bool,
    },
    Placeholder {
        text: String,
    },
    Text {
        text: String,
        exact: bool,
    },
    /// Keep matches whose text contains `text`
    HasText {
        text: String,
    },
    /// Keep matches containing an element matched by `query`
    Has {
        query: Query,
    },
    Nth {
        index: usize,
    },
}

/// Serializable description of a locator chain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    steps: Vec<Step>,
}

impl Query {
    pub fn new(step: Step) -> Self {
        Self { steps: vec![step] }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    fn then(&self, step: Step) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);
        Self { steps }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Css { selector } => write!(f, "locator('{}')", selector),
            Step::Role { role, name: Some(name), exact: true } => {
                write!(f, "getByRole('{}', {{ name: '{}', exact: true }})", role.as_str(), name)
            }
            Step::Role { role, name: Some(name), .. } => {
                write!(f, "getByRole('{}', {{ name: '{}' }})", role.as_str(), name)
            }
            Step::Role { role, name: None, .. } => write!(f, "getByRole('{}')", role.as_str()),
            Step::Placeholder { text } => write!(f, "getByPlaceholder('{}')", text),
            Step::Text { text, exact: true } => write!(f, "getByText('{}', {{ exact: true }})", text),
            Step::Text { text, .. } => write!(f, "getByText('{}')", text),
            Step::HasText { text } => write!(f, "filter({{ hasText: '{}' }})", text),
            Step::Has { query } => write!(f, "filter({{ has: {} }})", query),
            Step::Nth { index: 0 } => f.write_str("first()"),
            Step::Nth { index } => write!(f, "nth({})", index),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", step)?;
        }
        Ok(())
    }
}

/// Point-in-time visibility of everything a locator matches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Visibility {
    pub matches: usize,
    pub visible: usize,
}

/// Deferred handle to zero or more elements on a [`Page`]
#[derive(Clone)]
pub struct Locator {
    page: Page,
    query: Query,
}

impl Locator {
    pub(crate) fn new(page: Page, query: Query) -> Self {
        Self { page, query }
    }

    fn then(&self, step: Step) -> Self {
        Self {
            page: self.page.clone(),
            query: self.query.then(step),
        }
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Descendants matching a CSS selector
    pub fn locator(&self, selector: &str) -> Self {
        self.then(Step::Css { selector: selector.to_string() })
    }

    /// Descendants with `role` whose accessible name contains `name`
    pub fn get_by_role(&self, role: AriaRole, name: &str) -> Self {
        self.then(Step::Role {
            role,
            name: Some(name.to_string()),
            exact: false,
        })
    }

    pub fn get_by_placeholder(&self, text: &str) -> Self {
        self.then(Step::Placeholder { text: text.to_string() })
    }

    /// Descendants whose text contains `text`
    pub fn get_by_text(&self, text: &str) -> Self {
        self.then(Step::Text {
            text: text.to_string(),
            exact: false,
        })
    }

    /// Descendants whose whole text is `text`
    pub fn get_by_exact_text(&self, text: &str) -> Self {
        self.then(Step::Text {
            text: text.to_string(),
            exact: true,
        })
    }

    pub fn filter_has_text(&self, text: &str) -> Self {
        self.then(Step::HasText { text: text.to_string() })
    }

    /// Keep only matches that contain an element matched by `inner`.
    /// `inner` is evaluated relative to each match.
    pub fn filter_has(&self, inner: &Locator) -> Self {
        self.then(Step::Has { query: inner.query.clone() })
    }

    pub fn first(&self) -> Self {
        self.nth(0)
    }

    pub fn nth(&self, index: usize) -> Self {
        self.then(Step::Nth { index })
    }

    pub async fn click(&self) -> E2eResult<()> {
        debug!(locator = %self, "click");
        self.page
            .call(Command::Click {
                query: self.query.clone(),
                timeout_ms: self.page.timeouts().action_ms,
            })
            .await?;
        Ok(())
    }

    /// Replace the element's value in one step
    pub async fn fill(&self, value: &str) -> E2eResult<()> {
        debug!(locator = %self, "fill");
        self.page
            .call(Command::Fill {
                query: self.query.clone(),
                value: value.to_string(),
                timeout_ms: self.page.timeouts().action_ms,
            })
            .await?;
        Ok(())
    }

    /// Focus the element and type `text` one key at a time
    pub async fn press_sequentially(&self, text: &str) -> E2eResult<()> {
        debug!(locator = %self, "press_sequentially");
        self.page
            .call(Command::PressSequentially {
                query: self.query.clone(),
                text: text.to_string(),
                delay_ms: TYPE_DELAY_MS,
                timeout_ms: self.page.timeouts().action_ms,
            })
            .await?;
        Ok(())
    }

    /// Drag this element and drop it onto `target`
    pub async fn drag_to(&self, target: &Locator) -> E2eResult<()> {
        debug!(locator = %self, target = %target, "drag_to");
        self.page
            .call(Command::DragTo {
                source: self.query.clone(),
                target: target.query.clone(),
                timeout_ms: self.page.timeouts().action_ms,
            })
            .await?;
        Ok(())
    }

    pub async fn wait_for(&self, state: WaitState) -> E2eResult<()> {
        self.wait_for_within(state, self.page.timeouts().action_ms).await
    }

    pub async fn wait_for_within(&self, state: WaitState, timeout_ms: u64) -> E2eResult<()> {
        debug!(locator = %self, ?state, "wait_for");
        self.page
            .call(Command::WaitFor {
                query: self.query.clone(),
                state,
                timeout_ms,
            })
            .await?;
        Ok(())
    }

    pub async fn count(&self) -> E2eResult<usize> {
        self.read(Command::Count { query: self.query.clone() }).await
    }

    pub async fn visibility(&self) -> E2eResult<Visibility> {
        self.read(Command::Visibility { query: self.query.clone() }).await
    }

    /// Whether any match is visible right now; does not wait
    pub async fn is_visible(&self) -> E2eResult<bool> {
        Ok(self.visibility().await?.visible > 0)
    }

    pub async fn inner_texts(&self) -> E2eResult<Vec<String>> {
        self.read(Command::InnerTexts { query: self.query.clone() }).await
    }

    /// Computed style of the first match, `None` if nothing matches
    pub async fn css_value(&self, property: &str) -> E2eResult<Option<String>> {
        self.read(Command::CssValue {
            query: self.query.clone(),
            property: property.to_string(),
        })
        .await
    }

    pub async fn is_checked(&self) -> E2eResult<bool> {
        self.read(Command::IsChecked { query: self.query.clone() }).await
    }

    async fn read<T: serde::de::DeserializeOwned>(&self, command: Command) -> E2eResult<T> {
        let op = command.name();
        let value: Value = self.page.call(command).await?;
        serde_json::from_value(value)
            .map_err(|e| E2eError::Protocol(format!("{} reply for {}: {}", op, self, e)))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.query)
    }
}

impl fmt::Debug for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Locator").field(&self.query.to_string()).finish()
    }
}
