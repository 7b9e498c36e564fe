//! Read-only checks against the seeded test board

use async_trait::async_trait;

use super::{factory, Scenario, ScenarioFactory};
use crate::error::E2eResult;
use crate::fixtures::Fixtures;

const SUITE: &str = "kanbanBoard";

/// Lists the test board is seeded with, left to right
pub const SEEDED_LISTS: [&str; 4] = ["Project Resources", "To Do", "Doing", "Done"];

pub fn scenarios() -> Vec<ScenarioFactory> {
    vec![
        factory::<AssertListsOnBoard> as ScenarioFactory,
        factory::<AssertProjectResourcesHasCards> as ScenarioFactory,
    ]
}

#[derive(Default)]
pub struct AssertListsOnBoard;

#[async_trait]
impl Scenario for AssertListsOnBoard {
    fn suite(&self) -> &'static str {
        SUITE
    }

    fn name(&self) -> &'static str {
        "Assert lists on board"
    }

    async fn run(&mut self, fixtures: &mut Fixtures) -> E2eResult<()> {
        let board = fixtures.board()?;
        board.assert_list_count(SEEDED_LISTS.len()).await?;
        for list_name in SEEDED_LISTS {
            board.assert_list_exists(list_name).await?;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct AssertProjectResourcesHasCards;

#[async_trait]
impl Scenario for AssertProjectResourcesHasCards {
    fn suite(&self) -> &'static str {
        SUITE
    }

    fn name(&self) -> &'static str {
        "Assert Project Resources list has cards"
    }

    async fn run(&mut self, fixtures: &mut Fixtures) -> E2eResult<()> {
        let list_name = "Project Resources";
        let board = fixtures.board()?;
        board.assert_card_count_in_list(list_name, 4).await?;
        board.assert_card_exists_in_list(list_name, "Weekly Updates").await
    }
}
