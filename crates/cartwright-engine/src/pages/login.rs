use super::PageError;
use crate::interaction::Interactor;
use crate::locators::login;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct LoginPage {
    ui: Arc<Interactor>,
}

impl LoginPage {
    pub fn new(ui: Arc<Interactor>) -> Self {
        Self { ui }
    }

    pub async fn goto(&self) -> Result<(), PageError> {
        info!("Navigating to login page");
        self.ui.navigate("/").await?;
        Ok(())
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<(), PageError> {
        info!("Attempting to login with username: {}", username);
        self.ui.fill(login::USERNAME_INPUT, username).await?;
        self.ui.fill(login::PASSWORD_INPUT, password).await?;
        self.ui.click(login::LOGIN_BUTTON).await?;
        info!("Logged in as {}", username);
        Ok(())
    }

    /// The login error banner, or an empty string when none is shown.
    pub async fn error_message(&self) -> Result<String, PageError> {
        debug!("Getting error message if present");
        if !self.ui.is_visible(login::ERROR_MESSAGE).await {
            return Ok(String::new());
        }
        Ok(self.ui.get_text(login::ERROR_MESSAGE).await?)
    }

    pub async fn is_on_login_page(&self) -> bool {
        debug!("Checking if user is on login page");
        self.ui.is_visible(login::LOGIN_BUTTON).await
    }
}
