//! End-to-end scenarios, grouped into suites.
//!
//! A scenario is an async function over a fresh [`Pages`] fixture set. It
//! fails with [`ScenarioError::Assertion`] when the storefront misbehaves
//! and with [`ScenarioError::Page`] when the browser could not be driven.

use crate::host::HostError;
use crate::interaction::InteractionError;
use crate::pages::{PageError, Pages};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Fail the scenario with a formatted message unless `cond` holds.
macro_rules! ensure {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::scenarios::ScenarioError::Assertion(format!($($arg)+)));
        }
    };
}

mod cart_workflow;
mod login;
mod purchase;

pub type ScenarioFuture<'a> = Pin<Box<dyn Future<Output = Result<(), ScenarioError>> + Send + 'a>>;

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Page(#[from] PageError),

    #[error("Assertion failed: {0}")]
    Assertion(String),

    #[error("Browser host failed: {0}")]
    Host(#[from] HostError),

    #[error("Scenario timed out after {0:?}")]
    Timeout(Duration),
}

impl From<InteractionError> for ScenarioError {
    fn from(err: InteractionError) -> Self {
        ScenarioError::Page(PageError::Interaction(err))
    }
}

#[derive(Clone, Copy)]
pub struct Scenario {
    pub suite: &'static str,
    pub name: &'static str,
    pub run: fn(&Pages) -> ScenarioFuture<'_>,
}

impl Scenario {
    /// `suite › name`, as shown in reports.
    pub fn title(&self) -> String {
        format!("{} › {}", self.suite, self.name)
    }

    /// Case-insensitive match on suite or scenario name.
    pub fn matches(&self, pattern: &str) -> bool {
        let pattern = pattern.to_lowercase();
        self.suite.to_lowercase().contains(&pattern) || self.name.to_lowercase().contains(&pattern)
    }
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("suite", &self.suite)
            .field("name", &self.name)
            .finish()
    }
}

/// Every scenario, suite by suite.
pub fn all() -> Vec<Scenario> {
    let mut scenarios = Vec::new();
    scenarios.extend(login::suite());
    scenarios.extend(purchase::suite());
    scenarios.extend(cart_workflow::suite());
    scenarios
}

/// Scenarios whose suite or name contains `pattern`; all of them for `None`.
pub fn select(pattern: Option<&str>) -> Vec<Scenario> {
    all()
        .into_iter()
        .filter(|scenario| pattern.is_none_or(|p| scenario.matches(p)))
        .collect()
}

/// Log in as the standard user and wait for the inventory.
pub async fn login_as_standard_user(pages: &Pages) -> Result<(), ScenarioError> {
    let user = crate::data::users::STANDARD;
    pages.login.goto().await?;
    pages.login.login(user.username, user.password).await?;
    pages.inventory.wait_for_page_load().await?;
    Ok(())
}

/// Parse a price shown on the page, failing the scenario if it is not one.
fn price_of(text: &str) -> Result<crate::data::Price, ScenarioError> {
    crate::data::Price::parse(text)
        .ok_or_else(|| ScenarioError::Assertion(format!("expected a price, got {:?}", text)))
}
