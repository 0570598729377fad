//! Static test data for the storefront.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use std::str::FromStr;
use std::sync::LazyLock;

static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\s*(\d+)(?:\.(\d{1,2}))?").expect("valid price regex"));

/// An amount in cents, as printed by the storefront (`$29.99`,
/// `Total: $32.39`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Price(pub u64);

impl Price {
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    pub fn cents(&self) -> u64 {
        self.0
    }

    /// Extract the first dollar amount found in `text`.
    pub fn parse(text: &str) -> Option<Self> {
        let caps = PRICE_RE.captures(text)?;
        let dollars: u64 = caps.get(1)?.as_str().parse().ok()?;
        let cents = match caps.get(2) {
            Some(frac) if frac.as_str().len() == 1 => frac.as_str().parse::<u64>().ok()? * 10,
            Some(frac) => frac.as_str().parse::<u64>().ok()?,
            None => 0,
        };
        Some(Self(dollars * 100 + cents))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Add for Price {
    type Output = Price;

    fn add(self, rhs: Price) -> Price {
        Price(self.0 + rhs.0)
    }
}

impl std::iter::Sum for Price {
    fn sum<I: Iterator<Item = Price>>(iter: I) -> Price {
        iter.fold(Price::default(), Add::add)
    }
}

/// Orderings offered by the inventory sort dropdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    NameAscending,
    NameDescending,
    PriceLowToHigh,
    PriceHighToLow,
}

impl SortOrder {
    /// The `<option>` value the storefront uses.
    pub fn option_value(&self) -> &'static str {
        match self {
            SortOrder::NameAscending => "az",
            SortOrder::NameDescending => "za",
            SortOrder::PriceLowToHigh => "lohi",
            SortOrder::PriceHighToLow => "hilo",
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            SortOrder::NameAscending => "name A to Z",
            SortOrder::NameDescending => "name Z to A",
            SortOrder::PriceLowToHigh => "price low to high",
            SortOrder::PriceHighToLow => "price high to low",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.option_value())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "az" => Ok(SortOrder::NameAscending),
            "za" => Ok(SortOrder::NameDescending),
            "lohi" => Ok(SortOrder::PriceLowToHigh),
            "hilo" => Ok(SortOrder::PriceHighToLow),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct User {
    pub username: &'static str,
    pub password: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Customer {
    pub first_name: &'static str,
    pub last_name: &'static str,
    pub postal_code: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Product {
    pub name: &'static str,
    pub price: Price,
}

/// A product as read back from the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub name: String,
    pub price: String,
}

pub mod users {
    use super::User;

    const PASSWORD: &str = "secret_sauce";

    pub const STANDARD: User = User {
        username: "standard_user",
        password: PASSWORD,
    };
    pub const LOCKED_OUT: User = User {
        username: "locked_out_user",
        password: PASSWORD,
    };
    pub const PROBLEM: User = User {
        username: "problem_user",
        password: PASSWORD,
    };
    pub const PERFORMANCE_GLITCH: User = User {
        username: "performance_glitch_user",
        password: PASSWORD,
    };
}

pub mod customers {
    use super::Customer;

    pub const DEFAULT: Customer = Customer {
        first_name: "John",
        last_name: "Doe",
        postal_code: "12345",
    };
    pub const INVALID: Customer = Customer {
        first_name: "",
        last_name: "",
        postal_code: "",
    };
}

pub mod products {
    use super::{Price, Product};

    pub const BACKPACK: Product = Product {
        name: "Sauce Labs Backpack",
        price: Price::from_cents(2999),
    };
    pub const BIKE_LIGHT: Product = Product {
        name: "Sauce Labs Bike Light",
        price: Price::from_cents(999),
    };
    pub const BOLT_T_SHIRT: Product = Product {
        name: "Sauce Labs Bolt T-Shirt",
        price: Price::from_cents(1599),
    };
    pub const FLEECE_JACKET: Product = Product {
        name: "Sauce Labs Fleece Jacket",
        price: Price::from_cents(4999),
    };
    pub const ONESIE: Product = Product {
        name: "Sauce Labs Onesie",
        price: Price::from_cents(799),
    };
    pub const RED_T_SHIRT: Product = Product {
        name: "Test.allTheThings() T-Shirt (Red)",
        price: Price::from_cents(1599),
    };

    /// The catalogue in the storefront's default (name) order.
    pub const CATALOGUE: [Product; 6] = [
        BACKPACK,
        BIKE_LIGHT,
        BOLT_T_SHIRT,
        FLEECE_JACKET,
        ONESIE,
        RED_T_SHIRT,
    ];
}

pub mod messages {
    pub const FIRST_NAME_REQUIRED: &str = "Error: First Name is required";
    pub const LAST_NAME_REQUIRED: &str = "Error: Last Name is required";
    pub const POSTAL_CODE_REQUIRED: &str = "Error: Postal Code is required";
    pub const LOCKED_OUT_USER: &str = "Epic sadface: Sorry, this user has been locked out.";
    pub const ORDER_CONFIRMATION: &str = "Thank you for your order!";
}
