use super::PageError;
use crate::interaction::Interactor;
use crate::locators::{cart, checkout, common};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct CartPage {
    ui: Arc<Interactor>,
}

impl CartPage {
    pub fn new(ui: Arc<Interactor>) -> Self {
        Self { ui }
    }

    pub async fn proceed_to_checkout(&self) -> Result<(), PageError> {
        self.ui.click(cart::CHECKOUT_BUTTON).await?;
        info!("Proceeding to checkout");
        Ok(())
    }

    /// Fill the checkout form and press continue.
    pub async fn fill_checkout_info(
        &self,
        first_name: &str,
        last_name: &str,
        postal_code: &str,
    ) -> Result<(), PageError> {
        self.ui.fill(checkout::FIRST_NAME_INPUT, first_name).await?;
        self.ui.fill(checkout::LAST_NAME_INPUT, last_name).await?;
        self.ui.fill(checkout::POSTAL_CODE_INPUT, postal_code).await?;
        self.ui.click(checkout::CONTINUE_BUTTON).await?;
        info!("Filled checkout information");
        Ok(())
    }

    pub async fn complete_purchase(&self) -> Result<(), PageError> {
        self.ui.click(checkout::FINISH_BUTTON).await?;
        info!("Completed purchase");
        Ok(())
    }

    pub async fn confirmation_message(&self) -> Result<String, PageError> {
        Ok(self.ui.get_text(checkout::COMPLETE_HEADER).await?)
    }

    pub async fn is_item_in_cart(&self, item_name: &str) -> bool {
        self.ui.is_visible(&cart::cart_item(item_name)).await
    }

    pub async fn item_price(&self, item_name: &str) -> Result<String, PageError> {
        Ok(self.ui.get_text(&cart::item_price(item_name)).await?)
    }

    pub async fn total_price(&self) -> Result<String, PageError> {
        Ok(self.ui.get_text(cart::TOTAL_PRICE).await?)
    }

    pub async fn error_message(&self) -> Result<String, PageError> {
        Ok(self.ui.get_text(common::ERROR_MESSAGE).await?)
    }
}
