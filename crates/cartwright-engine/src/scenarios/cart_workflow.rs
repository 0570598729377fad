use super::{Scenario, ScenarioError, login_as_standard_user, price_of};
use crate::data::{Price, SortOrder, customers, messages, products};
use crate::pages::Pages;
use tracing::info;

const SUITE: &str = "Shopping Cart Workflows";

pub(super) fn suite() -> Vec<Scenario> {
    vec![
        Scenario {
            suite: SUITE,
            name: "complete purchase with multiple items and verify order total",
            run: |pages| Box::pin(purchase_and_verify_total(pages)),
        },
        Scenario {
            suite: SUITE,
            name: "add and remove items from cart",
            run: |pages| Box::pin(add_and_remove_items(pages)),
        },
        Scenario {
            suite: SUITE,
            name: "sort items and verify prices",
            run: |pages| Box::pin(sort_and_verify_prices(pages)),
        },
        Scenario {
            suite: SUITE,
            name: "validate checkout information requirements",
            run: |pages| Box::pin(validate_checkout_information(pages)),
        },
    ]
}

async fn purchase_and_verify_total(pages: &Pages) -> Result<(), ScenarioError> {
    login_as_standard_user(pages).await?;

    let items = [products::BACKPACK.name, products::BIKE_LIGHT.name];
    let mut item_prices: Vec<(&str, Price)> = Vec::new();
    for item in items {
        info!("Adding {} to cart", item);
        pages.inventory.add_item_to_cart(item).await?;
        let price = price_of(&pages.inventory.item_price(item).await?)?;
        item_prices.push((item, price));
    }

    let count = pages.inventory.cart_item_count().await?;
    ensure!(
        count as usize == items.len(),
        "cart badge shows {}, expected {}",
        count,
        items.len()
    );

    pages.inventory.go_to_cart().await?;
    for (item, price) in &item_prices {
        ensure!(pages.cart.is_item_in_cart(item).await, "{} missing from cart", item);
        let cart_price = pages.cart.item_price(item).await?;
        ensure!(
            cart_price == price.to_string(),
            "{} costs {} in the cart but {} in the inventory",
            item,
            cart_price,
            price
        );
    }

    let customer = customers::DEFAULT;
    pages.cart.proceed_to_checkout().await?;
    pages
        .cart
        .fill_checkout_info(customer.first_name, customer.last_name, customer.postal_code)
        .await?;

    // The total includes tax, so it must exceed the item subtotal.
    let total = price_of(&pages.cart.total_price().await?)?;
    let subtotal: Price = item_prices.iter().map(|(_, price)| *price).sum();
    ensure!(total > subtotal, "total {} not above subtotal {}", total, subtotal);

    pages.cart.complete_purchase().await?;
    let confirmation = pages.cart.confirmation_message().await?;
    ensure!(
        confirmation == messages::ORDER_CONFIRMATION,
        "unexpected confirmation {:?}",
        confirmation
    );
    Ok(())
}

async fn add_and_remove_items(pages: &Pages) -> Result<(), ScenarioError> {
    login_as_standard_user(pages).await?;

    let items = [
        products::BACKPACK.name,
        products::BIKE_LIGHT.name,
        products::BOLT_T_SHIRT.name,
    ];
    for item in items {
        pages.inventory.add_item_to_cart(item).await?;
        let count = pages.inventory.cart_item_count().await?;
        ensure!(count > 0, "cart empty after adding {}", item);
    }

    pages.inventory.remove_from_cart(items[1]).await?;
    let count = pages.inventory.cart_item_count().await?;
    ensure!(
        count as usize == items.len() - 1,
        "cart badge shows {} after removing one of {}",
        count,
        items.len()
    );

    pages.inventory.go_to_cart().await?;
    ensure!(pages.cart.is_item_in_cart(items[0]).await, "{} missing from cart", items[0]);
    ensure!(!pages.cart.is_item_in_cart(items[1]).await, "{} still in cart", items[1]);
    ensure!(pages.cart.is_item_in_cart(items[2]).await, "{} missing from cart", items[2]);
    Ok(())
}

async fn sort_and_verify_prices(pages: &Pages) -> Result<(), ScenarioError> {
    login_as_standard_user(pages).await?;

    let items = pages.inventory.all_items().await?;
    ensure!(!items.is_empty(), "inventory is empty");

    pages.inventory.sort_items(SortOrder::PriceHighToLow).await?;
    let prices = pages.inventory.all_prices().await?;
    let mut expected = prices.clone();
    expected.sort_by(|a, b| b.cmp(a));
    ensure!(prices == expected, "prices not descending: {:?}", prices);

    // Names were read before sorting, in the default order.
    pages.inventory.add_item_to_cart(&items[0]).await?;
    pages.inventory.sort_items(SortOrder::PriceLowToHigh).await?;
    pages.inventory.add_item_to_cart(&items[items.len() - 1]).await?;

    let count = pages.inventory.cart_item_count().await?;
    ensure!(count == 2, "cart badge shows {}, expected 2", count);
    Ok(())
}

async fn validate_checkout_information(pages: &Pages) -> Result<(), ScenarioError> {
    login_as_standard_user(pages).await?;

    pages.inventory.add_item_to_cart(products::BACKPACK.name).await?;
    pages.inventory.go_to_cart().await?;
    pages.cart.proceed_to_checkout().await?;

    let customer = customers::DEFAULT;
    let invalid = customers::INVALID;
    let attempts = [
        (
            invalid.first_name,
            invalid.last_name,
            invalid.postal_code,
            messages::FIRST_NAME_REQUIRED,
        ),
        (
            customer.first_name,
            invalid.last_name,
            invalid.postal_code,
            messages::LAST_NAME_REQUIRED,
        ),
        (
            customer.first_name,
            customer.last_name,
            invalid.postal_code,
            messages::POSTAL_CODE_REQUIRED,
        ),
    ];
    for (first_name, last_name, postal_code, expected) in attempts {
        pages
            .cart
            .fill_checkout_info(first_name, last_name, postal_code)
            .await?;
        let error = pages.cart.error_message().await?;
        ensure!(
            error.contains(expected),
            "expected {:?} in the error banner, got {:?}",
            expected,
            error
        );
    }

    pages
        .cart
        .fill_checkout_info(customer.first_name, customer.last_name, customer.postal_code)
        .await?;
    let total = pages.cart.total_price().await?;
    ensure!(!total.is_empty(), "checkout overview shows no total");
    Ok(())
}
