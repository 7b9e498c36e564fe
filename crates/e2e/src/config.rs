//! Suite configuration
//!
//! Everything except credentials can come from a YAML file; every field has
//! a default so an empty file (or no file) is a valid configuration.
//! Credentials are only ever read from the environment.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{E2eError, E2eResult};

/// Environment variable holding the automation user's email address
pub const EMAIL_ENV: &str = "EMAIL_ADDRESS";

/// Environment variable holding the automation user's password
pub const PASSWORD_ENV: &str = "PASSWORD";

/// Top-level suite configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct E2eConfig {
    /// The application under test
    pub target: TargetConfig,

    /// Browser and driver process settings
    pub driver: DriverConfig,

    /// Bounded waits for actions, assertions and navigation
    pub timeouts: Timeouts,

    /// Directory for test-results.json
    pub output_dir: PathBuf,

    /// Number of scenarios allowed to run at once, each in its own browser
    pub workers: usize,
}

impl Default for E2eConfig {
    fn default() -> Self {
        Self {
            target: TargetConfig::default(),
            driver: DriverConfig::default(),
            timeouts: Timeouts::default(),
            output_dir: PathBuf::from("test-results"),
            workers: 1,
        }
    }
}

impl E2eConfig {
    /// Load configuration from a YAML file, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> E2eResult<Self> {
        let config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                Self::from_yaml(&content)?
            }
            None => Self::default(),
        };
        Ok(config)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(E2eError::from)
    }

    /// Apply `E2E_BASE_URL`, `E2E_HEADED` and `E2E_BROWSER` from the process environment
    pub fn apply_env_overrides(&mut self) -> E2eResult<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> E2eResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("E2E_BASE_URL") {
            self.target.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(headed) = lookup("E2E_HEADED") {
            self.driver.headless = !matches!(headed.as_str(), "1" | "true" | "yes");
        }
        if let Some(browser) = lookup("E2E_BROWSER") {
            self.driver.browser = browser.parse()?;
        }
        Ok(())
    }

    /// Check the configuration for values that can only fail later and less clearly
    pub fn validate(&self) -> E2eResult<()> {
        if self.target.base_url.trim().is_empty() {
            return Err(E2eError::InvalidConfig("target.base_url is empty".to_string()));
        }
        if !self.target.base_url.starts_with("http://") && !self.target.base_url.starts_with("https://") {
            return Err(E2eError::InvalidConfig(format!(
                "target.base_url must be http(s): {}",
                self.target.base_url
            )));
        }
        Regex::new(&self.target.post_login_url_pattern)?;
        if self.workers == 0 {
            return Err(E2eError::InvalidConfig("workers must be at least 1".to_string()));
        }
        if self.timeouts.poll_interval_ms == 0 || self.timeouts.poll_interval_ms >= self.timeouts.expect_ms {
            return Err(E2eError::InvalidConfig(format!(
                "timeouts.poll_interval_ms ({}) must be non-zero and below timeouts.expect_ms ({})",
                self.timeouts.poll_interval_ms, self.timeouts.expect_ms
            )));
        }
        Ok(())
    }

    /// Full URL of the login page
    pub fn login_url(&self) -> String {
        format!(
            "{}/{}",
            self.target.base_url.trim_end_matches('/'),
            self.target.login_path.trim_start_matches('/')
        )
    }
}

/// Names and constants of the application under test
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub base_url: String,
    pub login_path: String,

    /// Regex the URL must match once login redirects
    pub post_login_url_pattern: String,

    /// Workspace heading shown on the boards page
    pub workspace_name: String,

    /// Link text of the board used by the tests
    pub board_name: String,

    /// Label attached during the card workflow
    pub label: LabelConfig,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: "https://trello.com".to_string(),
            login_path: "/login".to_string(),
            post_login_url_pattern: r"trello\.com/u/".to_string(),
            workspace_name: "Playwright".to_string(),
            board_name: "Playwright Test Board".to_string(),
            label: LabelConfig::default(),
        }
    }
}

/// A board label, as shown in the labels popover and on the card face
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub text: String,

    /// Computed CSS `background-color` of the label chip
    pub color: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            text: "High Priority".to_string(),
            color: "rgb(248, 113, 104)".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Browser {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" | "safari" => Ok(Browser::Webkit),
            other => Err(E2eError::InvalidConfig(format!("unknown browser: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 1280, height: 720 }
    }
}

/// Configuration for the Playwright driver process
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub browser: Browser,
    pub headless: bool,
    pub viewport: Viewport,

    /// Delay Playwright inserts between operations, for watching headed runs
    pub slow_mo_ms: u64,

    /// Node.js executable
    pub node_binary: PathBuf,

    /// Directory containing the `playwright` package (None = ./node_modules)
    pub node_modules_dir: Option<PathBuf>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            viewport: Viewport::default(),
            slow_mo_ms: 0,
            node_binary: PathBuf::from("node"),
            node_modules_dir: None,
        }
    }
}

impl DriverConfig {
    pub fn resolved_node_modules_dir(&self) -> PathBuf {
        self.node_modules_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("node_modules"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Actionability wait for click/fill/type/drag
    pub action_ms: u64,

    /// Polling window for assertions
    pub expect_ms: u64,

    /// Page loads and URL waits
    pub navigation_ms: u64,

    pub poll_interval_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            action_ms: 10_000,
            expect_ms: 5_000,
            navigation_ms: 30_000,
            poll_interval_ms: 100,
        }
    }
}

impl Timeouts {
    pub fn action(&self) -> Duration {
        Duration::from_millis(self.action_ms)
    }

    pub fn expect(&self) -> Duration {
        Duration::from_millis(self.expect_ms)
    }

    pub fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// The automation user's login
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    /// Read `EMAIL_ADDRESS` and `PASSWORD` from the process environment
    pub fn from_env() -> E2eResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through an arbitrary key lookup; blank values count as missing
    pub fn from_lookup<F>(lookup: F) -> E2eResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |var: &'static str| {
            lookup(var)
                .filter(|value| !value.trim().is_empty())
                .ok_or(E2eError::MissingCredential { var })
        };
        Ok(Self {
            email: read(EMAIL_ENV)?,
            password: read(PASSWORD_ENV)?,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use test_case::test_case;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = E2eConfig::default();
        config.validate().unwrap();
        assert_eq!(config.login_url(), "https://trello.com/login");
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
target:
  base_url: http://127.0.0.1:3000
  board_name: Staging Board
driver:
  browser: firefox
  headless: false
timeouts:
  expect_ms: 8000
workers: 2
"#;
        let config = E2eConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.target.base_url, "http://127.0.0.1:3000");
        assert_eq!(config.target.board_name, "Staging Board");
        assert_eq!(config.target.workspace_name, "Playwright");
        assert_eq!(config.driver.browser, Browser::Firefox);
        assert!(!config.driver.headless);
        assert_eq!(config.timeouts.expect_ms, 8000);
        assert_eq!(config.timeouts.action_ms, 10_000);
        assert_eq!(config.workers, 2);
        config.validate().unwrap();
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("e2e.yaml");
        std::fs::write(&path, "workers: 3\ntarget:\n  login_path: signin\n").unwrap();

        let config = E2eConfig::load(Some(&path)).unwrap();
        assert_eq!(config.workers, 3);
        assert_eq!(config.login_url(), "https://trello.com/signin");
    }

    #[test]
    fn test_env_overrides() {
        let mut config = E2eConfig::default();
        config
            .apply_overrides_from(lookup(&[
                ("E2E_BASE_URL", "http://localhost:8080/"),
                ("E2E_HEADED", "1"),
                ("E2E_BROWSER", "webkit"),
            ]))
            .unwrap();
        assert_eq!(config.target.base_url, "http://localhost:8080");
        assert!(!config.driver.headless);
        assert_eq!(config.driver.browser, Browser::Webkit);
    }

    #[test]
    fn test_unknown_browser_is_config_error() {
        let mut config = E2eConfig::default();
        let err = config
            .apply_overrides_from(lookup(&[("E2E_BROWSER", "lynx")]))
            .unwrap_err();
        assert!(err.is_config_error());
    }

    #[test_case("", 1, 100 ; "empty base url")]
    #[test_case("ftp://trello.com", 1, 100 ; "non http base url")]
    #[test_case("https://trello.com", 0, 100 ; "zero workers")]
    #[test_case("https://trello.com", 1, 5000 ; "poll interval not below expect timeout")]
    fn test_validate_rejects(base_url: &str, workers: usize, poll_interval_ms: u64) {
        let mut config = E2eConfig::default();
        config.target.base_url = base_url.to_string();
        config.workers = workers;
        config.timeouts.poll_interval_ms = poll_interval_ms;
        assert!(config.validate().unwrap_err().is_config_error());
    }

    #[test]
    fn test_validate_rejects_bad_url_pattern() {
        let mut config = E2eConfig::default();
        config.target.post_login_url_pattern = "trello(".to_string();
        assert!(matches!(config.validate(), Err(E2eError::InvalidUrlPattern(_))));
    }

    #[test]
    fn test_credentials_from_lookup() {
        let creds = Credentials::from_lookup(lookup(&[
            (EMAIL_ENV, "bot@example.com"),
            (PASSWORD_ENV, "hunter2"),
        ]))
        .unwrap();
        assert_eq!(creds.email, "bot@example.com");
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }

    #[test_case(&[(PASSWORD_ENV, "hunter2")], EMAIL_ENV ; "email missing")]
    #[test_case(&[(EMAIL_ENV, "bot@example.com")], PASSWORD_ENV ; "password missing")]
    #[test_case(&[(EMAIL_ENV, "  "), (PASSWORD_ENV, "hunter2")], EMAIL_ENV ; "email blank")]
    fn test_missing_credentials_fail_fast(pairs: &[(&str, &str)], expected: &str) {
        match Credentials::from_lookup(lookup(pairs)) {
            Err(E2eError::MissingCredential { var }) => assert_eq!(var, expected),
            other => panic!("expected MissingCredential, got {:?}", other),
        }
    }
}
