//! Page objects for the storefront screens.
//!
//! Each page shares one [`Interactor`], so every page built by [`Pages`]
//! drives the same browser context.

mod cart;
mod checkout;
mod inventory;
mod login;

pub use cart::CartPage;
pub use checkout::CheckoutPage;
pub use inventory::InventoryPage;
pub use login::LoginPage;

use crate::data::SortOrder;
use crate::interaction::{InteractionError, Interactor};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error(transparent)]
    Interaction(#[from] InteractionError),

    #[error("Unexpected text in {selector}: {text:?}")]
    UnexpectedText { selector: String, text: String },

    #[error("Items were not sorted correctly in {0} order")]
    NotSorted(SortOrder),
}

/// The page fixtures for one scenario.
#[derive(Clone)]
pub struct Pages {
    pub login: LoginPage,
    pub inventory: InventoryPage,
    pub cart: CartPage,
    pub checkout: CheckoutPage,
    ui: Arc<Interactor>,
}

impl Pages {
    pub fn new(ui: Interactor) -> Self {
        let ui = Arc::new(ui);
        Self {
            login: LoginPage::new(ui.clone()),
            inventory: InventoryPage::new(ui.clone()),
            cart: CartPage::new(ui.clone()),
            checkout: CheckoutPage::new(ui.clone()),
            ui,
        }
    }

    pub fn interactor(&self) -> &Interactor {
        &self.ui
    }
}
