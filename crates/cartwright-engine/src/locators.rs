//! Selector tables for the storefront screens.

pub mod common {
    pub const SHOPPING_CART: &str = ".shopping_cart_link";
    pub const CART_BADGE: &str = ".shopping_cart_badge";
    pub const ERROR_MESSAGE: &str = "[data-test=\"error\"]";

    /// Any element tagged with `data-test="{name}"`.
    pub fn data_test(name: &str) -> String {
        format!("[data-test=\"{}\"]", name)
    }

    pub fn container(id: &str) -> String {
        format!("#{}_container", id)
    }
}

pub mod login {
    pub const USERNAME_INPUT: &str = "[data-test=\"username\"]";
    pub const PASSWORD_INPUT: &str = "[data-test=\"password\"]";
    pub const LOGIN_BUTTON: &str = "[data-test=\"login-button\"]";
    pub const ERROR_MESSAGE: &str = super::common::ERROR_MESSAGE;
}

pub mod inventory {
    pub const CONTAINER: &str = "#inventory_container";
    pub const CART_LINK: &str = super::common::SHOPPING_CART;
    pub const CART_BADGE: &str = super::common::CART_BADGE;
    pub const SORT_DROPDOWN: &str = ".product_sort_container";
    pub const ITEM_NAME: &str = ".inventory_item_name";
    pub const ITEM_PRICE: &str = ".inventory_item_price";

    pub fn add_to_cart_button(item_name: &str) -> String {
        format!(
            "//div[text()={}]/ancestor::div[@class='inventory_item']//button[contains(@data-test, 'add-to-cart')]",
            super::xpath_literal(item_name)
        )
    }

    pub fn remove_button(item_name: &str) -> String {
        format!(
            "//div[text()={}]/ancestor::div[@class='inventory_item']//button[contains(@data-test, 'remove')]",
            super::xpath_literal(item_name)
        )
    }

    pub fn item_price(item_name: &str) -> String {
        format!(
            "//div[text()={}]/ancestor::div[@class='inventory_item']//div[@class='inventory_item_price']",
            super::xpath_literal(item_name)
        )
    }
}

pub mod cart {
    pub const CHECKOUT_BUTTON: &str = "[data-test=\"checkout\"]";
    pub const TOTAL_PRICE: &str = ".summary_total_label";

    pub fn cart_item(item_name: &str) -> String {
        format!(
            "//div[text()={} and contains(@class, 'inventory_item_name')]",
            super::xpath_literal(item_name)
        )
    }

    pub fn item_price(item_name: &str) -> String {
        format!(
            "//div[text()={}]/ancestor::div[contains(@class, 'cart_item')]//div[@class='inventory_item_price']",
            super::xpath_literal(item_name)
        )
    }
}

pub mod checkout {
    pub const FIRST_NAME_INPUT: &str = "[data-test=\"firstName\"]";
    pub const LAST_NAME_INPUT: &str = "[data-test=\"lastName\"]";
    pub const POSTAL_CODE_INPUT: &str = "[data-test=\"postalCode\"]";
    pub const CONTINUE_BUTTON: &str = "[data-test=\"continue\"]";
    pub const FINISH_BUTTON: &str = "[data-test=\"finish\"]";
    pub const TOTAL_PRICE: &str = ".summary_total_label";
    pub const COMPLETE_HEADER: &str = ".complete-header";
    pub const ERROR_MESSAGE: &str = super::common::ERROR_MESSAGE;
}

/// Quote `text` as an XPath string literal. Product names may contain
/// apostrophes, which XPath 1.0 can only express through `concat()`.
pub fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        return format!("'{}'", text);
    }
    if !text.contains('"') {
        return format!("\"{}\"", text);
    }
    let parts: Vec<String> = text.split('\'').map(|part| format!("'{}'", part)).collect();
    format!("concat({})", parts.join(", \"'\", "))
}
