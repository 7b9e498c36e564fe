//! Error types for E2E testing

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Missing credential: environment variable {var} is not set")]
    MissingCredential { var: &'static str },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Playwright not found. Install with: npm install playwright && npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Playwright driver exited before replying")]
    DriverExited,

    #[error("Driver protocol error: {0}")]
    Protocol(String),

    #[error("Assertion failed: expected {target} {expected}, got {actual}")]
    AssertionFailed {
        target: String,
        expected: String,
        actual: String,
    },

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Card composer is not open; call click_add_a_card_in_list first")]
    ComposerNotOpen,

    #[error("Card composer is held by list '{held_by}', cannot open it for '{requested}' before submitting")]
    ComposerBusy { held_by: String, requested: String },

    #[error("Fixture not prepared for this scenario: {0}")]
    FixtureUnavailable(&'static str),

    #[error("Invalid URL pattern: {0}")]
    InvalidUrlPattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl E2eError {
    /// Whether the failure comes from test infrastructure setup rather than
    /// from the application under test.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            E2eError::MissingCredential { .. }
                | E2eError::InvalidConfig(_)
                | E2eError::InvalidUrlPattern(_)
                | E2eError::Yaml(_)
        )
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
