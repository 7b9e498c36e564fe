//! Kanban board E2E test framework
//!
//! This crate drives a real browser against a hosted kanban board app and
//! checks the login flow, the seeded board, and a full card lifecycle:
//! - Keeps one Playwright driver process per test session, spoken to over a
//!   line-delimited JSON protocol
//! - Models each screen as a page object built from lazy locators
//! - Asserts with web-first polling expectations
//! - Runs scenarios in isolated sessions with guaranteed teardown
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    E2E Test Runner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── preflight()          playwright + target reachable  │
//! │    ├── run_scenarios()      one session per scenario       │
//! │    │     ├── Fixtures::launch() -> PlaywrightDriver         │
//! │    │     ├── bootstrap_board()  log in, open board          │
//! │    │     ├── Scenario::run / Scenario::teardown             │
//! │    │     └── Fixtures::close()                              │
//! │    └── write_results()      test-results.json              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Page objects                                               │
//! │    Login ─ Boards ─ KanbanBoard ─ CardDetails               │
//! │      └── Locator (Page + Query) ── expect() polling         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Transport ── stdin/stdout JSON ──> driver.js (Playwright)  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod expect;
pub mod fixtures;
pub mod locator;
pub mod page;
pub mod pages;
pub mod randomizer;
pub mod runner;
pub mod scenarios;

pub use config::{Credentials, E2eConfig};
pub use error::{E2eError, E2eResult};
pub use expect::expect;
pub use fixtures::Fixtures;
pub use locator::Locator;
pub use page::Page;
pub use runner::{Outcome, TestResult, TestRunner, TestSuiteResult};
pub use scenarios::{all_scenarios, Scenario};
