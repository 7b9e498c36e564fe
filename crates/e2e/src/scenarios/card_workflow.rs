//! Full card lifecycle: create, describe, label, move, then clean up

use async_trait::async_trait;
use tracing::{debug, info};

use super::{factory, Scenario, ScenarioFactory};
use crate::error::E2eResult;
use crate::fixtures::Fixtures;
use crate::randomizer::unique_name;

const SUITE: &str = "cardWorkflow";

pub const CARD_TITLE_PREFIX: &str = "Card to test in Playwright";
pub const DESCRIPTION: &str = "Text in the description field. Added by Playwright.";

const STARTING_LIST: &str = "To Do";
const DESTINATION_LIST: &str = "Done";

pub fn scenarios() -> Vec<ScenarioFactory> {
    vec![factory::<CardWorkflow> as ScenarioFactory]
}

pub struct CardWorkflow {
    title: String,
    created: bool,
}

impl Default for CardWorkflow {
    fn default() -> Self {
        Self {
            title: unique_name(CARD_TITLE_PREFIX),
            created: false,
        }
    }
}

impl CardWorkflow {
    pub fn title(&self) -> &str {
        &self.title
    }
}

#[async_trait]
impl Scenario for CardWorkflow {
    fn suite(&self) -> &'static str {
        SUITE
    }

    fn name(&self) -> &'static str {
        "Card workflow"
    }

    async fn run(&mut self, fixtures: &mut Fixtures) -> E2eResult<()> {
        let label = fixtures.config.target.label.clone();
        let (board, card_details) = fixtures.board_and_details()?;
        info!("Card under test: '{}'", self.title);

        // Add a card to "To Do"
        let cards_before = board.card_count_in_list(STARTING_LIST).await?;
        board.create_card(STARTING_LIST, &self.title).await?;
        self.created = true;
        board.assert_card_exists_in_list(STARTING_LIST, &self.title).await?;
        board
            .assert_card_count_in_list(STARTING_LIST, cards_before + 1)
            .await?;

        // Describe it
        board.open_card(&self.title).await?;
        card_details.fill_description_field(DESCRIPTION).await?;
        card_details.click_save_button().await?;
        card_details.assert_description_field_text(DESCRIPTION).await?;

        // Label it
        card_details.add_label_to_card(&label.text).await?;
        card_details.close_details().await?;
        let card = board.card_in_list(STARTING_LIST, &self.title);
        card_details
            .assert_label_is_visible_with_color(&card, &label.text, &label.color)
            .await?;

        // Move it to "Done"
        board.drag_card_to_list(&self.title, DESTINATION_LIST).await?;
        board
            .assert_card_does_not_exist_in_list(STARTING_LIST, &self.title)
            .await?;
        board.assert_card_exists_in_list(DESTINATION_LIST, &self.title).await?;

        // The description survives closing and reopening
        board.open_card(&self.title).await?;
        card_details.assert_description_field_text(DESCRIPTION).await
    }

    async fn teardown(&mut self, fixtures: &mut Fixtures) -> E2eResult<()> {
        if !self.created {
            debug!("No card was created, nothing to clean up");
            return Ok(());
        }
        let (board, card_details) = fixtures.board_and_details()?;

        if !card_details.is_card_details_dialog_open().await? {
            board.open_card(&self.title).await?;
        }
        card_details.archive_card().await?;
        card_details.delete_card().await?;

        board.assert_card_does_not_exist_on_board(&self.title).await
    }
}
