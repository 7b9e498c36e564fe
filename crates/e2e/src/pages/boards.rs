//! Boards landing page shown after login

use crate::config::TargetConfig;
use crate::error::E2eResult;
use crate::expect::expect;
use crate::locator::{AriaRole, Locator, WaitState};
use crate::page::Page;

pub struct Boards {
    navigation_timeout_ms: u64,

    // Text elements
    logged_in_header: Locator,
    your_workspaces_header: Locator,
    workspace_name: Locator,

    // Links
    board_link: Locator,
}

impl Boards {
    pub fn new(page: &Page, target: &TargetConfig) -> Self {
        let workspaces_section = page.locator("div.boards-page-board-section");
        Self {
            navigation_timeout_ms: page.timeouts().navigation_ms,
            logged_in_header: page.locator("#logged-in-skeleton-header"),
            your_workspaces_header: page.get_by_role(AriaRole::Heading, "YOUR WORKSPACES"),
            workspace_name: workspaces_section
                .get_by_role(AriaRole::Heading, &target.workspace_name),
            board_link: workspaces_section.get_by_role(AriaRole::Link, &target.board_name),
        }
    }

    /// Wait for the loading skeleton header to appear and then disappear
    pub async fn wait_for_boards_page_to_load(&self) -> E2eResult<()> {
        self.logged_in_header
            .wait_for_within(WaitState::Visible, self.navigation_timeout_ms)
            .await?;
        self.logged_in_header
            .wait_for_within(WaitState::Hidden, self.navigation_timeout_ms)
            .await
    }

    pub async fn assert_your_workspaces_header_visible(&self) -> E2eResult<()> {
        expect(&self.your_workspaces_header).to_be_visible().await
    }

    /// Nothing from the workspaces view is on screen
    pub async fn assert_your_workspaces_header_not_visible(&self) -> E2eResult<()> {
        expect(&self.your_workspaces_header).not().to_be_visible().await
    }

    pub async fn assert_workspace_name_visible(&self) -> E2eResult<()> {
        expect(&self.workspace_name).to_be_visible().await
    }

    /// Click the link to the board used by the tests
    pub async fn open_board(&self) -> E2eResult<()> {
        self.board_link.click().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testing::{page_with, ScriptedTransport};
    use crate::driver::Command;
    use crate::error::E2eError;
    use serde_json::json;

    #[tokio::test]
    async fn test_loading_waits_for_visible_then_hidden() {
        let transport = ScriptedTransport::permissive();
        let page = page_with(transport.clone());
        Boards::new(&page, &TargetConfig::default())
            .wait_for_boards_page_to_load()
            .await
            .unwrap();

        let states: Vec<WaitState> = transport
            .calls()
            .into_iter()
            .map(|command| match command {
                Command::WaitFor { state, timeout_ms, .. } => {
                    assert_eq!(timeout_ms, 2_000);
                    state
                }
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(states, vec![WaitState::Visible, WaitState::Hidden]);
    }

    #[tokio::test]
    async fn test_board_link_scoped_to_workspace_section() {
        let transport = ScriptedTransport::permissive();
        let page = page_with(transport.clone());
        let target = TargetConfig {
            board_name: "Sprint Board".to_string(),
            ..TargetConfig::default()
        };
        Boards::new(&page, &target).open_board().await.unwrap();

        match &transport.calls()[0] {
            Command::Click { query, .. } => assert_eq!(
                query.to_string(),
                "locator('div.boards-page-board-section').getByRole('link', { name: 'Sprint Board' })"
            ),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_landing_page_assertions() {
        let transport = ScriptedTransport::permissive();
        let page = page_with(transport.clone());
        let boards = Boards::new(&page, &TargetConfig::default());
        boards.assert_your_workspaces_header_visible().await.unwrap();
        boards.assert_workspace_name_visible().await.unwrap();
        assert_eq!(transport.ops(), vec!["visibility", "visibility"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_workspaces_header_not_visible() {
        let hidden = ScriptedTransport::new(|_| Ok(json!({ "matches": 0, "visible": 0 })));
        Boards::new(&page_with(hidden), &TargetConfig::default())
            .assert_your_workspaces_header_not_visible()
            .await
            .unwrap();

        let shown = ScriptedTransport::permissive();
        let result = Boards::new(&page_with(shown), &TargetConfig::default())
            .assert_your_workspaces_header_not_visible()
            .await;
        match result {
            Err(E2eError::AssertionFailed { expected, .. }) => {
                assert_eq!(expected, "not to be visible")
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
