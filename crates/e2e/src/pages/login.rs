//! Login page: email step, then password step

use tracing::debug;

use crate::config::Credentials;
use crate::error::E2eResult;
use crate::expect::expect;
use crate::locator::{AriaRole, Locator};
use crate::page::Page;

/// Shown under the password field after a rejected login
pub const INCORRECT_CREDENTIALS_MESSAGE: &str =
    "Incorrect email address and / or password. Do you need help logging in?";

pub struct Login {
    // Input fields
    email_address_field: Locator,
    password_field: Locator,

    // Buttons
    continue_button: Locator,
    login_button: Locator,

    // Text elements
    password_error_message: Locator,
}

impl Login {
    pub fn new(page: &Page) -> Self {
        Self {
            email_address_field: page.get_by_placeholder("Enter email"),
            password_field: page.get_by_placeholder("Enter password"),
            continue_button: page.get_by_role(AriaRole::Button, "Continue"),
            login_button: page.get_by_role(AriaRole::Button, "Log in"),
            password_error_message: page.locator("#password-error"),
        }
    }

    pub async fn fill_email_address(&self, email: &str) -> E2eResult<()> {
        debug!("Entering email address {}", email);
        self.email_address_field.fill(email).await
    }

    /// Enter the automation user's email address
    pub async fn fill_email_address_with_automation_user(&self, credentials: &Credentials) -> E2eResult<()> {
        self.fill_email_address(&credentials.email).await
    }

    pub async fn click_continue_button(&self) -> E2eResult<()> {
        self.continue_button.click().await
    }

    pub async fn fill_password(&self, password: &str) -> E2eResult<()> {
        self.password_field.fill(password).await
    }

    /// Enter the automation user's password; the value is never logged
    pub async fn fill_password_with_automation_password(&self, credentials: &Credentials) -> E2eResult<()> {
        self.fill_password(&credentials.password).await
    }

    pub async fn click_login_button(&self) -> E2eResult<()> {
        self.login_button.click().await
    }

    pub async fn assert_incorrect_password_message(&self) -> E2eResult<()> {
        expect(&self.password_error_message)
            .to_contain_text(INCORRECT_CREDENTIALS_MESSAGE)
            .await
    }

    pub async fn assert_no_incorrect_password_message(&self) -> E2eResult<()> {
        expect(&self.password_error_message).to_be_hidden().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testing::{page_with, ScriptedTransport};
    use crate::driver::Command;
    use crate::error::E2eError;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_two_step_login_sequence() {
        let transport = ScriptedTransport::permissive();
        let page = page_with(transport.clone());
        let login = Login::new(&page);

        login.fill_email_address("test@gmail.com").await.unwrap();
        login.click_continue_button().await.unwrap();
        login.fill_password("password").await.unwrap();
        login.click_login_button().await.unwrap();

        let calls = transport.calls();
        assert_eq!(transport.ops(), vec!["fill", "click", "fill", "click"]);
        match &calls[0] {
            Command::Fill { query, value, .. } => {
                assert_eq!(query.to_string(), "getByPlaceholder('Enter email')");
                assert_eq!(value, "test@gmail.com");
            }
            other => panic!("unexpected {:?}", other),
        }
        match &calls[3] {
            Command::Click { query, .. } => {
                assert_eq!(query.to_string(), "getByRole('button', { name: 'Log in' })")
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_automation_user_fills_from_credentials() {
        let transport = ScriptedTransport::permissive();
        let page = page_with(transport.clone());
        let login = Login::new(&page);
        let credentials = Credentials {
            email: "bot@example.com".to_string(),
            password: "hunter2".to_string(),
        };

        login.fill_email_address_with_automation_user(&credentials).await.unwrap();
        login.fill_password_with_automation_password(&credentials).await.unwrap();

        let filled: Vec<(String, String)> = transport
            .calls()
            .into_iter()
            .map(|command| match command {
                Command::Fill { query, value, .. } => (query.to_string(), value),
                other => panic!("unexpected {:?}", other),
            })
            .collect();
        assert_eq!(
            filled,
            vec![
                ("getByPlaceholder('Enter email')".to_string(), "bot@example.com".to_string()),
                ("getByPlaceholder('Enter password')".to_string(), "hunter2".to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_incorrect_password_message() {
        let transport = ScriptedTransport::new(|command| match command {
            Command::InnerTexts { .. } => Ok(json!([INCORRECT_CREDENTIALS_MESSAGE])),
            _ => Ok(Value::Null),
        });
        let page = page_with(transport);
        Login::new(&page)
            .assert_incorrect_password_message()
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_incorrect_password_message_missing() {
        let transport = ScriptedTransport::new(|command| match command {
            Command::InnerTexts { .. } => Ok(json!([])),
            Command::Visibility { .. } => Ok(json!({ "matches": 0, "visible": 0 })),
            _ => Ok(Value::Null),
        });
        let page = page_with(transport);
        let login = Login::new(&page);
        assert!(matches!(
            login.assert_incorrect_password_message().await,
            Err(E2eError::AssertionFailed { .. })
        ));
        login.assert_no_incorrect_password_message().await.unwrap();
    }
}
