use super::PageError;
use crate::interaction::Interactor;
use crate::locators::checkout;
use std::sync::Arc;

#[derive(Clone)]
pub struct CheckoutPage {
    ui: Arc<Interactor>,
}

impl CheckoutPage {
    pub fn new(ui: Arc<Interactor>) -> Self {
        Self { ui }
    }

    pub async fn fill_shipping_info(
        &self,
        first_name: &str,
        last_name: &str,
        postal_code: &str,
    ) -> Result<(), PageError> {
        self.ui.fill(checkout::FIRST_NAME_INPUT, first_name).await?;
        self.ui.fill(checkout::LAST_NAME_INPUT, last_name).await?;
        self.ui.fill(checkout::POSTAL_CODE_INPUT, postal_code).await?;
        Ok(())
    }

    pub async fn continue_to_overview(&self) -> Result<(), PageError> {
        self.ui.click(checkout::CONTINUE_BUTTON).await?;
        Ok(())
    }

    pub async fn total_price(&self) -> Result<String, PageError> {
        Ok(self.ui.get_text(checkout::TOTAL_PRICE).await?)
    }

    pub async fn finish_checkout(&self) -> Result<(), PageError> {
        self.ui.click(checkout::FINISH_BUTTON).await?;
        Ok(())
    }

    pub async fn confirmation_message(&self) -> Result<String, PageError> {
        Ok(self.ui.get_text(checkout::COMPLETE_HEADER).await?)
    }

    pub async fn is_order_complete(&self) -> bool {
        self.ui.is_visible(checkout::COMPLETE_HEADER).await
    }
}
