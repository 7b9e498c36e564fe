//! Per-test fixtures and the logged-in board bootstrap

use std::sync::Arc;

use tracing::info;

use crate::config::{Credentials, E2eConfig};
use crate::driver::PlaywrightDriver;
use crate::error::{E2eError, E2eResult};
use crate::page::Page;
use crate::pages::{Boards, CardDetails, KanbanBoard, Login};

/// Where the automation user's credentials come from, keyed by variable name
pub type CredentialLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Log in as the automation user and land on the boards page
pub async fn log_in_as_automation_user(
    page: &Page,
    config: &E2eConfig,
    credentials: &Credentials,
) -> E2eResult<()> {
    // Navigate to login page
    page.goto(&config.login_url()).await?;

    // Enter the automation user's email address and click Continue
    let login = Login::new(page);
    login.fill_email_address_with_automation_user(credentials).await?;
    login.click_continue_button().await?;

    // Enter the automation user's password and click Log in
    login.fill_password_with_automation_password(credentials).await?;
    login.click_login_button().await?;

    // Wait for page to redirect and load
    page.wait_for_url(&config.target.post_login_url_pattern).await?;
    let boards = Boards::new(page, &config.target);
    boards.wait_for_boards_page_to_load().await?;

    // Expect the workspaces section with the configured workspace
    boards.assert_your_workspaces_header_visible().await?;
    boards.assert_workspace_name_visible().await
}

/// Log in, open the test board, and hand back a board page object
pub async fn open_kanban_board(
    page: &Page,
    config: &E2eConfig,
    credentials: &Credentials,
) -> E2eResult<KanbanBoard> {
    log_in_as_automation_user(page, config, credentials).await?;
    Boards::new(page, &config.target).open_board().await?;
    info!("Opened board '{}'", config.target.board_name);
    Ok(KanbanBoard::new(page))
}

/// Handles injected into a scenario. One browser session per instance.
pub struct Fixtures {
    pub config: Arc<E2eConfig>,
    pub page: Page,
    pub login_page: Login,
    pub boards: Boards,
    pub card_details: CardDetails,

    /// Present once [`Fixtures::bootstrap_board`] has run
    pub kanban_board: Option<KanbanBoard>,

    credential_lookup: CredentialLookup,
}

impl Fixtures {
    /// Start a fresh, isolated browser session
    pub async fn launch(config: Arc<E2eConfig>) -> E2eResult<Self> {
        let driver = PlaywrightDriver::launch(&config.driver, &config.timeouts).await?;
        let page = Page::new(Arc::new(driver), config.timeouts);
        Ok(Self::from_page(page, config))
    }

    pub fn from_page(page: Page, config: Arc<E2eConfig>) -> Self {
        Self {
            login_page: Login::new(&page),
            boards: Boards::new(&page, &config.target),
            card_details: CardDetails::new(&page),
            kanban_board: None,
            credential_lookup: Arc::new(|key: &str| std::env::var(key).ok()),
            page,
            config,
        }
    }

    /// Read credentials from `lookup` instead of the process environment
    pub fn with_credential_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.credential_lookup = Arc::new(lookup);
        self
    }

    pub fn credentials(&self) -> E2eResult<Credentials> {
        Credentials::from_lookup(|key| (self.credential_lookup)(key))
    }

    /// Log in and open the test board.
    ///
    /// Credentials are resolved before the browser is touched, so a missing
    /// variable surfaces as a configuration error rather than a failed login.
    pub async fn bootstrap_board(&mut self) -> E2eResult<()> {
        let credentials = self.credentials()?;
        let board = open_kanban_board(&self.page, &self.config, &credentials).await?;
        self.kanban_board = Some(board);
        Ok(())
    }

    pub fn board(&mut self) -> E2eResult<&mut KanbanBoard> {
        self.kanban_board
            .as_mut()
            .ok_or(E2eError::FixtureUnavailable("kanban_board"))
    }

    pub fn board_and_details(&mut self) -> E2eResult<(&mut KanbanBoard, &CardDetails)> {
        let board = self
            .kanban_board
            .as_mut()
            .ok_or(E2eError::FixtureUnavailable("kanban_board"))?;
        Ok((board, &self.card_details))
    }

    pub async fn close(self) -> E2eResult<()> {
        self.page.close().await
    }
}
