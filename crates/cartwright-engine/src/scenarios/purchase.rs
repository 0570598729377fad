use super::{Scenario, ScenarioError, login_as_standard_user, price_of};
use crate::data::{Price, SortOrder, customers};
use crate::pages::Pages;
use tracing::info;

const SUITE: &str = "Complete Purchase Flow";

/// Order value the high-value purchase must reach.
const HIGH_VALUE: Price = Price::from_cents(10_000);
const MIN_ITEMS: usize = 3;

pub(super) fn suite() -> Vec<Scenario> {
    vec![
        Scenario {
            suite: SUITE,
            name: "verify all product prices and sort functionality",
            run: |pages| Box::pin(verify_prices_and_sort(pages)),
        },
        Scenario {
            suite: SUITE,
            name: "complete high-value purchase with multiple items",
            run: |pages| Box::pin(high_value_purchase(pages)),
        },
    ]
}

async fn verify_prices_and_sort(pages: &Pages) -> Result<(), ScenarioError> {
    login_as_standard_user(pages).await?;

    let prices = pages.inventory.all_prices().await?;
    ensure!(!prices.is_empty(), "expected at least one product price");
    ensure!(
        prices.iter().all(|price| price.cents() > 0),
        "every product price must be positive: {:?}",
        prices
    );

    pages.inventory.sort_items(SortOrder::PriceHighToLow).await?;

    let sorted = pages.inventory.all_prices().await?;
    for pair in sorted.windows(2) {
        ensure!(
            pair[0] >= pair[1],
            "prices not descending: {} before {}",
            pair[0],
            pair[1]
        );
    }
    Ok(())
}

async fn high_value_purchase(pages: &Pages) -> Result<(), ScenarioError> {
    login_as_standard_user(pages).await?;

    // Most expensive first, so the threshold is reached quickly.
    pages.inventory.sort_items(SortOrder::PriceHighToLow).await?;
    let items = pages.inventory.all_items().await?;
    let prices = pages.inventory.all_prices().await?;

    let mut total = Price::default();
    let mut selected = Vec::new();
    for (item, price) in items.iter().zip(&prices) {
        total = total + *price;
        selected.push(item.clone());
        pages.inventory.add_item_to_cart(item).await?;

        if selected.len() >= MIN_ITEMS && total >= HIGH_VALUE {
            break;
        }
    }
    info!("Selected {} items totalling {}", selected.len(), total);

    ensure!(
        selected.len() >= MIN_ITEMS,
        "expected at least {} items, selected {}",
        MIN_ITEMS,
        selected.len()
    );
    ensure!(total >= HIGH_VALUE, "expected at least {}, got {}", HIGH_VALUE, total);

    pages.inventory.go_to_cart().await?;
    for product in &selected {
        ensure!(
            pages.cart.is_item_in_cart(product).await,
            "{} missing from cart",
            product
        );
    }

    pages.cart.proceed_to_checkout().await?;
    let customer = customers::DEFAULT;
    pages
        .checkout
        .fill_shipping_info(customer.first_name, customer.last_name, customer.postal_code)
        .await?;
    pages.checkout.continue_to_overview().await?;

    let final_total = price_of(&pages.checkout.total_price().await?)?;
    ensure!(
        final_total >= HIGH_VALUE,
        "order total {} below {}",
        final_total,
        HIGH_VALUE
    );

    pages.checkout.finish_checkout().await?;

    let confirmation = pages.checkout.confirmation_message().await?;
    ensure!(
        confirmation.contains("Thank you for your order"),
        "unexpected confirmation {:?}",
        confirmation
    );
    ensure!(
        pages.checkout.is_order_complete().await,
        "order completion header not shown"
    );
    Ok(())
}
