//! The board view: named lists of cards
//!
//! Lists are addressed by their heading and cards by their text. Nothing is
//! resolved until an action or assertion runs, so a card found by text keeps
//! working after it is dragged to another list.

use tracing::{debug, info};

use crate::error::{E2eError, E2eResult};
use crate::expect::expect;
use crate::locator::{AriaRole, Locator};
use crate::page::Page;

/// The board has one new-card title input, shared by every list's composer.
/// Whoever opened the composer last owns it until the card is submitted.
#[derive(Debug, Default)]
struct ComposerSlot {
    held_by: Option<String>,
}

impl ComposerSlot {
    fn check_available(&self, list_name: &str) -> E2eResult<()> {
        match &self.held_by {
            Some(held_by) if held_by != list_name => Err(E2eError::ComposerBusy {
                held_by: held_by.clone(),
                requested: list_name.to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn hold(&mut self, list_name: &str) {
        self.held_by = Some(list_name.to_string());
    }

    fn holder(&self) -> E2eResult<&str> {
        self.held_by.as_deref().ok_or(E2eError::ComposerNotOpen)
    }

    fn release(&mut self) -> Option<String> {
        self.held_by.take()
    }
}

pub struct KanbanBoard {
    page: Page,

    // Lists
    all_lists: Locator,

    // Inputs
    title_for_new_card_input: Locator,

    // Buttons
    add_card_button: Locator,

    composer: ComposerSlot,
}

impl KanbanBoard {
    pub fn new(page: &Page) -> Self {
        Self {
            page: page.clone(),
            all_lists: page.locator(".list"),
            title_for_new_card_input: page.get_by_placeholder("Enter a title for this card…"),
            add_card_button: page.get_by_role(AriaRole::Button, "Add card"),
            composer: ComposerSlot::default(),
        }
    }

    /// The list whose heading is exactly `name`
    pub fn list_with_name(&self, name: &str) -> Locator {
        self.all_lists
            .filter_has(&self.page.locator("h2").get_by_exact_text(name))
    }

    pub fn cards_in_list(&self, list_name: &str) -> Locator {
        self.list_with_name(list_name).locator(".list-card")
    }

    pub fn card_in_list(&self, list_name: &str, text: &str) -> Locator {
        self.cards_in_list(list_name).filter_has_text(text)
    }

    /// A card anywhere on the board, for cards that may have moved
    pub fn card_on_board(&self, text: &str) -> Locator {
        self.page.locator(".list-card").filter_has_text(text)
    }

    pub fn add_a_card_button(&self, list_name: &str) -> Locator {
        self.list_with_name(list_name).locator(".open-card-composer")
    }

    /// How many cards `list_name` holds right now; does not wait
    pub async fn card_count_in_list(&self, list_name: &str) -> E2eResult<usize> {
        self.cards_in_list(list_name).count().await
    }

    pub async fn assert_list_count(&self, count: usize) -> E2eResult<()> {
        expect(&self.all_lists).to_have_count(count).await
    }

    pub async fn assert_list_exists(&self, name: &str) -> E2eResult<()> {
        expect(&self.list_with_name(name)).to_be_visible().await
    }

    pub async fn assert_card_count_in_list(&self, list_name: &str, count: usize) -> E2eResult<()> {
        expect(&self.cards_in_list(list_name)).to_have_count(count).await
    }

    pub async fn assert_card_exists_in_list(&self, list_name: &str, text: &str) -> E2eResult<()> {
        expect(&self.card_in_list(list_name, text)).to_be_visible().await
    }

    pub async fn assert_card_does_not_exist_in_list(&self, list_name: &str, text: &str) -> E2eResult<()> {
        expect(&self.card_in_list(list_name, text)).not().to_be_visible().await
    }

    pub async fn assert_card_does_not_exist_on_board(&self, text: &str) -> E2eResult<()> {
        expect(&self.card_on_board(text)).to_have_count(0).await
    }

    /// Open the card composer of `list_name`; takes the composer slot
    pub async fn click_add_a_card_in_list(&mut self, list_name: &str) -> E2eResult<()> {
        self.composer.check_available(list_name)?;
        self.add_a_card_button(list_name).click().await?;
        self.composer.hold(list_name);
        Ok(())
    }

    /// Type the title into the open composer
    pub async fn enter_title_for_new_card(&mut self, title: &str) -> E2eResult<()> {
        let list_name = self.composer.holder()?;
        debug!("Entering title '{}' in composer of '{}'", title, list_name);
        self.title_for_new_card_input.fill(title).await
    }

    /// Submit the composer; releases the composer slot
    pub async fn click_add_card_button(&mut self) -> E2eResult<()> {
        self.composer.holder()?;
        self.add_card_button.click().await?;
        if let Some(list_name) = self.composer.release() {
            info!("Added card to '{}'", list_name);
        }
        Ok(())
    }

    /// Open the composer in `list_name`, enter `title`, submit
    pub async fn create_card(&mut self, list_name: &str, title: &str) -> E2eResult<()> {
        self.click_add_a_card_in_list(list_name).await?;
        self.enter_title_for_new_card(title).await?;
        self.click_add_card_button().await
    }

    /// Open the card details of the card with `text`, wherever it is
    pub async fn open_card(&self, text: &str) -> E2eResult<()> {
        self.card_on_board(text).click().await
    }

    pub async fn drag_card_to_list(&self, card_text: &str, destination_list_name: &str) -> E2eResult<()> {
        info!("Dragging '{}' to '{}'", card_text, destination_list_name);
        let card = self.card_on_board(card_text);
        let destination = self.list_with_name(destination_list_name);
        card.drag_to(&destination).await
    }
}
