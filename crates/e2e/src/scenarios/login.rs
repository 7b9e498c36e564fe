//! Login form, with bad and good credentials

use async_trait::async_trait;

use super::{factory, Scenario, ScenarioFactory};
use crate::error::E2eResult;
use crate::fixtures::Fixtures;

const SUITE: &str = "login";

pub fn scenarios() -> Vec<ScenarioFactory> {
    vec![
        factory::<EnterInvalidCredentials> as ScenarioFactory,
        factory::<EnterValidCredentials> as ScenarioFactory,
    ]
}

#[derive(Default)]
pub struct EnterInvalidCredentials;

#[async_trait]
impl Scenario for EnterInvalidCredentials {
    fn suite(&self) -> &'static str {
        SUITE
    }

    fn name(&self) -> &'static str {
        "Enter invalid credentials"
    }

    fn needs_board(&self) -> bool {
        false
    }

    fn needs_credentials(&self) -> bool {
        false
    }

    async fn run(&mut self, fixtures: &mut Fixtures) -> E2eResult<()> {
        fixtures.page.goto(&fixtures.config.login_url()).await?;

        // Enter an email address and click Continue
        fixtures.login_page.fill_email_address("test@gmail.com").await?;
        fixtures.login_page.click_continue_button().await?;

        // Enter an invalid password and click Log in
        fixtures.login_page.fill_password("password").await?;
        fixtures.login_page.click_login_button().await?;

        fixtures.login_page.assert_incorrect_password_message().await?;

        // Still on the login page
        fixtures.boards.assert_your_workspaces_header_not_visible().await
    }
}

#[derive(Default)]
pub struct EnterValidCredentials;

#[async_trait]
impl Scenario for EnterValidCredentials {
    fn suite(&self) -> &'static str {
        SUITE
    }

    fn name(&self) -> &'static str {
        "Enter valid credentials"
    }

    fn needs_board(&self) -> bool {
        false
    }

    async fn run(&mut self, fixtures: &mut Fixtures) -> E2eResult<()> {
        let credentials = fixtures.credentials()?;
        fixtures.page.goto(&fixtures.config.login_url()).await?;

        // Enter the automation user's email address and click Continue
        fixtures
            .login_page
            .fill_email_address_with_automation_user(&credentials)
            .await?;
        fixtures.login_page.click_continue_button().await?;

        // Enter the automation user's password and click Log in
        fixtures
            .login_page
            .fill_password_with_automation_password(&credentials)
            .await?;
        fixtures.login_page.click_login_button().await?;

        // Wait for page to redirect and load
        fixtures
            .page
            .wait_for_url(&fixtures.config.target.post_login_url_pattern)
            .await?;
        fixtures.boards.wait_for_boards_page_to_load().await?;

        fixtures.boards.assert_your_workspaces_header_visible().await?;
        fixtures.boards.assert_workspace_name_visible().await
    }
}
