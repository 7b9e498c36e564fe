//! Card details dialog opened from the board

use tracing::debug;

use crate::error::E2eResult;
use crate::expect::expect;
use crate::locator::{AriaRole, Locator, WaitState};
use crate::page::Page;

pub struct CardDetails {
    page: Page,

    // Sections
    dialog: Locator,
    labels_popover: Locator,

    // Inputs
    empty_description_field: Locator,

    // Buttons
    save_button: Locator,
    close_details_button: Locator,
    archive_button: Locator,
    delete_button: Locator,
    confirm_delete_button: Locator,
    labels_button: Locator,
    close_popover_button: Locator,

    // Text elements
    description_paragraphs: Locator,
}

impl CardDetails {
    pub fn new(page: &Page) -> Self {
        let labels_popover = page.locator("div.pop-over");
        Self {
            page: page.clone(),
            dialog: page.locator("div[role=\"dialog\"]"),
            empty_description_field: page.get_by_placeholder("Add a more detailed description…"),
            save_button: page.get_by_role(AriaRole::Button, "Save").first(),
            close_details_button: page.get_by_role(AriaRole::Button, "Close dialog"),
            archive_button: page.get_by_role(AriaRole::Link, "Archive"),
            delete_button: page.get_by_role(AriaRole::Link, "Delete"),
            confirm_delete_button: page.get_by_role(AriaRole::Button, "Delete"),
            labels_button: page.get_by_role(AriaRole::Link, "Labels"),
            close_popover_button: labels_popover.get_by_role(AriaRole::Button, "Close popover"),
            labels_popover,
            description_paragraphs: page.locator("div.description-content p"),
        }
    }

    /// Click the empty description field to focus the editor, then type
    /// `text` key by key
    pub async fn fill_description_field(&self, text: &str) -> E2eResult<()> {
        self.empty_description_field.click().await?;
        self.page.keyboard_type(text).await
    }

    pub async fn click_save_button(&self) -> E2eResult<()> {
        self.save_button.click().await
    }

    /// The rendered description has a paragraph whose text is exactly `text`
    pub async fn assert_description_field_text(&self, text: &str) -> E2eResult<()> {
        expect(&self.description_paragraphs.filter_has_text(text))
            .to_have_text(text)
            .await
    }

    /// Click the X and wait until the dialog is gone
    pub async fn close_details(&self) -> E2eResult<()> {
        self.close_details_button.click().await?;
        self.dialog.wait_for(WaitState::Hidden).await
    }

    /// Whether the dialog is showing right now; does not wait
    pub async fn is_card_details_dialog_open(&self) -> E2eResult<bool> {
        self.dialog.is_visible().await
    }

    pub async fn archive_card(&self) -> E2eResult<()> {
        self.archive_button.click().await
    }

    /// Click "Delete", then confirm in the "Delete card?" popover
    pub async fn delete_card(&self) -> E2eResult<()> {
        self.delete_button.click().await?;
        self.confirm_delete_button.click().await
    }

    /// Tick the label named `label_text` in the labels popover, check that it
    /// registered, and close the popover
    pub async fn add_label_to_card(&self, label_text: &str) -> E2eResult<()> {
        debug!("Adding label '{}'", label_text);
        self.labels_button.click().await?;

        let label_row = self.labels_popover.locator("li").filter_has_text(label_text);
        label_row.locator("label").click().await?;
        expect(&label_row.locator("input[type=\"checkbox\"]"))
            .to_be_checked()
            .await?;

        self.close_popover_button.click().await
    }

    /// Exactly one chip named `label_text` shows on the face of `card`, with
    /// the given background color
    pub async fn assert_label_is_visible_with_color(
        &self,
        card: &Locator,
        label_text: &str,
        color: &str,
    ) -> E2eResult<()> {
        let chip = card.locator(".card-label").filter_has_text(label_text);
        expect(&chip).to_be_visible().await?;
        expect(&chip).to_have_css("background-color", color).await
    }
}
