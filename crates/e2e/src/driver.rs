//! Playwright browser automation
//!
//! The browser is owned by a long-lived Node.js process running the embedded
//! `driver.js`. Requests and replies are single-line JSON objects on the
//! child's stdin/stdout; the driver's stderr is forwarded to `tracing`.
//!
//! ```text
//! -> {"id":3,"op":"click","query":{"steps":[...]},"timeout_ms":10000}
//! <- {"id":3,"ok":true,"value":null}
//! <- {"id":4,"ok":false,"error":{"kind":"timeout","message":"..."}}
//! ```

use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command as TokioCommand};
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};

use crate::config::{Browser, DriverConfig, Timeouts, Viewport};
use crate::error::{E2eError, E2eResult};
use crate::locator::{Query, WaitState};

const DRIVER_SCRIPT: &str = include_str!("driver.js");

/// Extra time the Rust side waits beyond an operation's own timeout before
/// giving up on the reply.
const REPLY_GRACE: Duration = Duration::from_secs(5);

/// One operation understood by the driver
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Launch {
        browser: Browser,
        headless: bool,
        viewport: Viewport,
        slow_mo_ms: u64,
        timeout_ms: u64,
    },
    Goto {
        url: String,
        timeout_ms: u64,
    },
    WaitForUrl {
        pattern: String,
        timeout_ms: u64,
    },
    Click {
        query: Query,
        timeout_ms: u64,
    },
    Fill {
        query: Query,
        value: String,
        timeout_ms: u64,
    },
    PressSequentially {
        query: Query,
        text: String,
        delay_ms: u64,
        timeout_ms: u64,
    },
    KeyboardType {
        text: String,
        delay_ms: u64,
    },
    DragTo {
        source: Query,
        target: Query,
        timeout_ms: u64,
    },
    WaitFor {
        query: Query,
        state: WaitState,
        timeout_ms: u64,
    },
    Count {
        query: Query,
    },
    Visibility {
        query: Query,
    },
    InnerTexts {
        query: Query,
    },
    CssValue {
        query: Query,
        property: String,
    },
    IsChecked {
        query: Query,
    },
    Close,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Launch { .. } => "launch",
            Command::Goto { .. } => "goto",
            Command::WaitForUrl { .. } => "wait_for_url",
            Command::Click { .. } => "click",
            Command::Fill { .. } => "fill",
            Command::PressSequentially { .. } => "press_sequentially",
            Command::KeyboardType { .. } => "keyboard_type",
            Command::DragTo { .. } => "drag_to",
            Command::WaitFor { .. } => "wait_for",
            Command::Count { .. } => "count",
            Command::Visibility { .. } => "visibility",
            Command::InnerTexts { .. } => "inner_texts",
            Command::CssValue { .. } => "css_value",
            Command::IsChecked { .. } => "is_checked",
            Command::Close => "close",
        }
    }

    /// The engine-side timeout carried by this command, if any
    pub fn timeout_ms(&self) -> Option<u64> {
        match self {
            Command::Launch { timeout_ms, .. }
            | Command::Goto { timeout_ms, .. }
            | Command::WaitForUrl { timeout_ms, .. }
            | Command::Click { timeout_ms, .. }
            | Command::Fill { timeout_ms, .. }
            | Command::PressSequentially { timeout_ms, .. }
            | Command::DragTo { timeout_ms, .. }
            | Command::WaitFor { timeout_ms, .. } => Some(*timeout_ms),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct Request<'a> {
    id: u64,
    #[serde(flatten)]
    command: &'a Command,
}

#[derive(Debug, Deserialize)]
struct Response {
    id: u64,
    ok: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    error: Option<DriverFault>,
}

#[derive(Debug, Deserialize)]
struct DriverFault {
    kind: String,
    message: String,
}

impl Response {
    fn into_result(self, op: &str) -> E2eResult<Value> {
        if self.ok {
            return Ok(self.value);
        }
        let fault = self.error.unwrap_or(DriverFault {
            kind: "error".to_string(),
            message: "driver reported failure without detail".to_string(),
        });
        match fault.kind.as_str() {
            "timeout" => Err(E2eError::Timeout(format!("{}: {}", op, fault.message))),
            _ => Err(E2eError::Playwright(format!("{}: {}", op, fault.message))),
        }
    }
}

/// Something that can execute driver commands for one browser session
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(&self, command: Command) -> E2eResult<Value>;

    async fn shutdown(&self) -> E2eResult<()>;
}

/// Playwright browser handle backed by a Node.js child process
pub struct PlaywrightDriver {
    io: Mutex<DriverIo>,
    next_id: AtomicU64,
    /// Reply wait for commands that carry no timeout of their own
    default_wait: Duration,
    _script_dir: TempDir,
}

struct DriverIo {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl DriverIo {
    async fn read_response(&mut self, id: u64) -> E2eResult<Response> {
        loop {
            let line = self
                .stdout
                .next_line()
                .await?
                .ok_or(E2eError::DriverExited)?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let response: Response = match serde_json::from_str(line) {
                Ok(response) => response,
                Err(_) => {
                    debug!("driver stdout: {}", line);
                    continue;
                }
            };

            if response.id == id {
                return Ok(response);
            }
            if response.id < id {
                // Reply to a request we already gave up on
                warn!("Discarding late driver reply {}", response.id);
                continue;
            }
            return Err(E2eError::Protocol(format!(
                "expected reply {}, got {}",
                id, response.id
            )));
        }
    }
}

impl PlaywrightDriver {
    /// Spawn the driver and launch a fresh browser with its own context
    pub async fn launch(config: &DriverConfig, timeouts: &Timeouts) -> E2eResult<Self> {
        let version = Self::check_playwright_installed().await?;
        info!("Launching {} via Playwright {}", config.browser, version);

        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("driver.js");
        std::fs::write(&script_path, DRIVER_SCRIPT)?;

        let mut modules = config.resolved_node_modules_dir();
        if modules.is_relative() {
            modules = std::env::current_dir()?.join(modules);
        }
        let mut node_path = vec![modules];
        if let Some(existing) = std::env::var_os("NODE_PATH") {
            node_path.extend(std::env::split_paths(&existing));
        }
        let node_path = std::env::join_paths(node_path)
            .map_err(|e| E2eError::InvalidConfig(format!("bad node_modules_dir: {}", e)))?;

        let mut child = TokioCommand::new(&config.node_binary)
            .arg(&script_path)
            .env("NODE_PATH", node_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                E2eError::Playwright(format!(
                    "Failed to spawn {}: {}",
                    config.node_binary.display(),
                    e
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| E2eError::Protocol("driver stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| E2eError::Protocol("driver stdout unavailable".to_string()))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "kanban_e2e::driver::node", "{}", line);
                }
            });
        }

        let driver = Self {
            io: Mutex::new(DriverIo {
                child,
                stdin: Some(stdin),
                stdout: BufReader::new(stdout).lines(),
            }),
            next_id: AtomicU64::new(1),
            default_wait: timeouts.action(),
            _script_dir: script_dir,
        };

        driver
            .call(Command::Launch {
                browser: config.browser,
                headless: config.headless,
                viewport: config.viewport,
                slow_mo_ms: config.slow_mo_ms,
                timeout_ms: timeouts.navigation_ms,
            })
            .await?;

        Ok(driver)
    }

    /// Check if Playwright is installed and return its version
    pub async fn check_playwright_installed() -> E2eResult<String> {
        let output = TokioCommand::new("npx")
            .args(["--no-install", "playwright", "--version"])
            .stdin(Stdio::null())
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {
                parse_playwright_version(&String::from_utf8_lossy(&output.stdout))
                    .ok_or(E2eError::PlaywrightNotFound)
            }
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }
}

#[async_trait]
impl Transport for PlaywrightDriver {
    async fn call(&self, command: Command) -> E2eResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let op = command.name();
        let wait = command
            .timeout_ms()
            .map(Duration::from_millis)
            .unwrap_or(self.default_wait)
            + REPLY_GRACE;

        let mut line = serde_json::to_string(&Request { id, command: &command })?;
        line.push('\n');

        let mut io = self.io.lock().await;
        trace!(id, op, "-> driver");
        let stdin = io.stdin.as_mut().ok_or(E2eError::DriverExited)?;
        stdin.write_all(line.as_bytes()).await?;
        stdin.flush().await?;

        let response = tokio::time::timeout(wait, io.read_response(id))
            .await
            .map_err(|_| E2eError::Timeout(format!("driver reply to {} after {:?}", op, wait)))??;
        trace!(id, op, ok = response.ok, "<- driver");
        response.into_result(op)
    }

    async fn shutdown(&self) -> E2eResult<()> {
        match self.call(Command::Close).await {
            Ok(_) | Err(E2eError::DriverExited) => {}
            Err(e) => warn!("Driver close failed: {}", e),
        }

        let mut io = self.io.lock().await;
        // Dropping stdin ends the driver's read loop
        io.stdin.take();
        match tokio::time::timeout(Duration::from_secs(5), io.child.wait()).await {
            Ok(status) => {
                debug!("Driver exited: {:?}", status?);
            }
            Err(_) => {
                warn!("Driver did not exit, killing it");
                io.child.kill().await?;
            }
        }
        Ok(())
    }
}

fn parse_playwright_version(output: &str) -> Option<String> {
    let re = Regex::new(r"(\d+\.\d+\.\d+)").ok()?;
    re.captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::Step;
    use serde_json::json;

    #[test]
    fn test_request_wire_format() {
        let command = Command::Click {
            query: Query::new(Step::Css { selector: ".list".to_string() }),
            timeout_ms: 5000,
        };
        let wire = serde_json::to_value(Request { id: 7, command: &command }).unwrap();
        assert_eq!(
            wire,
            json!({
                "id": 7,
                "op": "click",
                "query": { "steps": [{ "kind": "css", "selector": ".list" }] },
                "timeout_ms": 5000
            })
        );
    }

    #[test]
    fn test_unit_command_wire_format() {
        let wire = serde_json::to_value(Request { id: 1, command: &Command::Close }).unwrap();
        assert_eq!(wire, json!({ "id": 1, "op": "close" }));
    }

    #[test]
    fn test_response_ok() {
        let response: Response =
            serde_json::from_str(r#"{"id":2,"ok":true,"value":4}"#).unwrap();
        assert_eq!(response.into_result("count").unwrap(), json!(4));
    }

    #[test]
    fn test_response_timeout_maps_to_timeout_error() {
        let response: Response = serde_json::from_str(
            r#"{"id":2,"ok":false,"error":{"kind":"timeout","message":"locator.click: Timeout 10000ms exceeded."}}"#,
        )
        .unwrap();
        match response.into_result("click") {
            Err(E2eError::Timeout(msg)) => assert!(msg.starts_with("click: ")),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[test]
    fn test_response_error_maps_to_playwright_error() {
        let response: Response = serde_json::from_str(
            r#"{"id":2,"ok":false,"error":{"kind":"error","message":"strict mode violation"}}"#,
        )
        .unwrap();
        assert!(matches!(
            response.into_result("click"),
            Err(E2eError::Playwright(_))
        ));
    }

    #[test]
    fn test_command_timeouts() {
        assert_eq!(
            Command::Goto { url: "https://trello.com/login".to_string(), timeout_ms: 30_000 }
                .timeout_ms(),
            Some(30_000)
        );
        assert_eq!(Command::Close.timeout_ms(), None);
    }

    #[test]
    fn test_parse_playwright_version() {
        assert_eq!(
            parse_playwright_version("Version 1.42.1\n"),
            Some("1.42.1".to_string())
        );
        assert_eq!(parse_playwright_version("command not found"), None);
    }

    #[test]
    fn test_driver_script_handles_every_op() {
        for op in [
            "launch",
            "goto",
            "wait_for_url",
            "click",
            "fill",
            "press_sequentially",
            "keyboard_type",
            "drag_to",
            "wait_for",
            "count",
            "visibility",
            "inner_texts",
            "css_value",
            "is_checked",
            "close",
        ] {
            assert!(
                DRIVER_SCRIPT.contains(&format!("async {}(", op)),
                "driver.js has no handler for {}",
                op
            );
        }
    }
}
