use super::PageError;
use crate::data::{Price, ProductInfo, SortOrder};
use crate::interaction::Interactor;
use crate::locators::inventory;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Timeout for waits on a single inventory item.
const ITEM_TIMEOUT: Duration = Duration::from_millis(5000);

/// Time the list gets to re-render after a sort.
const SORT_SETTLE: Duration = Duration::from_millis(1000);

#[derive(Clone)]
pub struct InventoryPage {
    ui: Arc<Interactor>,
}

impl InventoryPage {
    pub fn new(ui: Arc<Interactor>) -> Self {
        Self { ui }
    }

    pub async fn wait_for_page_load(&self) -> Result<(), PageError> {
        self.ui.wait_for_visible(inventory::CONTAINER).await?;
        Ok(())
    }

    pub async fn add_item_to_cart(&self, item_name: &str) -> Result<(), PageError> {
        let button = inventory::add_to_cart_button(item_name);
        self.ui.wait_for_visible_within(&button, ITEM_TIMEOUT).await?;
        self.ui.click(&button).await?;
        info!("Added {} to cart", item_name);
        Ok(())
    }

    pub async fn remove_from_cart(&self, item_name: &str) -> Result<(), PageError> {
        let button = inventory::remove_button(item_name);
        self.ui.wait_for_visible_within(&button, ITEM_TIMEOUT).await?;
        self.ui.click(&button).await?;
        info!("Removed {} from cart", item_name);
        Ok(())
    }

    /// Number shown on the cart badge. A badge that does not render within
    /// the item timeout means an empty cart.
    pub async fn cart_item_count(&self) -> Result<u32, PageError> {
        if !self.ui.appears_within(inventory::CART_BADGE, ITEM_TIMEOUT).await {
            debug!("Cart badge not shown, cart is empty");
            return Ok(0);
        }
        let text = self.ui.get_text(inventory::CART_BADGE).await?;
        text.trim().parse().map_err(|_| PageError::UnexpectedText {
            selector: inventory::CART_BADGE.to_string(),
            text,
        })
    }

    pub async fn go_to_cart(&self) -> Result<(), PageError> {
        self.ui.click(inventory::CART_LINK).await?;
        Ok(())
    }

    pub async fn item_price(&self, item_name: &str) -> Result<String, PageError> {
        let selector = inventory::item_price(item_name);
        self.ui.wait_for_visible_within(&selector, ITEM_TIMEOUT).await?;
        Ok(self.ui.get_text(&selector).await?)
    }

    pub async fn all_items(&self) -> Result<Vec<String>, PageError> {
        Ok(self.ui.all_texts(inventory::ITEM_NAME, ITEM_TIMEOUT).await?)
    }

    pub async fn all_prices(&self) -> Result<Vec<Price>, PageError> {
        let texts = self.ui.all_texts(inventory::ITEM_PRICE, ITEM_TIMEOUT).await?;
        texts
            .into_iter()
            .map(|text| {
                Price::parse(&text).ok_or_else(|| PageError::UnexpectedText {
                    selector: inventory::ITEM_PRICE.to_string(),
                    text,
                })
            })
            .collect()
    }

    /// Sort the inventory and check the page actually reordered.
    pub async fn sort_items(&self, order: SortOrder) -> Result<(), PageError> {
        self.ui
            .select_option(inventory::SORT_DROPDOWN, order.option_value())
            .await?;
        info!("Sorting items by {}", order.describe());

        tokio::time::sleep(SORT_SETTLE).await;

        let sorted = match order {
            SortOrder::PriceHighToLow => is_ordered(&self.all_prices().await?, |a, b| a >= b),
            SortOrder::PriceLowToHigh => is_ordered(&self.all_prices().await?, |a, b| a <= b),
            SortOrder::NameAscending => is_ordered(&self.all_items().await?, |a, b| a <= b),
            SortOrder::NameDescending => is_ordered(&self.all_items().await?, |a, b| a >= b),
        };
        if !sorted {
            return Err(PageError::NotSorted(order));
        }
        Ok(())
    }

    /// Every listed product with the price read from its own item card.
    pub async fn all_products_with_prices(&self) -> Result<Vec<ProductInfo>, PageError> {
        let mut products = Vec::new();
        for name in self.all_items().await? {
            let price = self.item_price(&name).await?;
            products.push(ProductInfo { name, price });
        }
        Ok(products)
    }
}

fn is_ordered<T>(items: &[T], in_order: impl Fn(&T, &T) -> bool) -> bool {
    items.windows(2).all(|pair| in_order(&pair[0], &pair[1]))
}
