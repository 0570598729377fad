use super::{Scenario, ScenarioError, login_as_standard_user};
use crate::data::{messages, users};
use crate::pages::Pages;

const SUITE: &str = "Login";

pub(super) fn suite() -> Vec<Scenario> {
    vec![
        Scenario {
            suite: SUITE,
            name: "standard user reaches the inventory",
            run: |pages| Box::pin(standard_user_reaches_inventory(pages)),
        },
        Scenario {
            suite: SUITE,
            name: "locked out user is rejected",
            run: |pages| Box::pin(locked_out_user_is_rejected(pages)),
        },
    ]
}

async fn standard_user_reaches_inventory(pages: &Pages) -> Result<(), ScenarioError> {
    login_as_standard_user(pages).await?;

    let url = pages.interactor().current_url().await?;
    ensure!(url.contains("inventory"), "expected the inventory page, at {}", url);
    ensure!(
        !pages.login.is_on_login_page().await,
        "login button still visible after logging in"
    );
    Ok(())
}

async fn locked_out_user_is_rejected(pages: &Pages) -> Result<(), ScenarioError> {
    let user = users::LOCKED_OUT;
    pages.login.goto().await?;
    pages.login.login(user.username, user.password).await?;

    let error = pages.login.error_message().await?;
    ensure!(
        error.contains(messages::LOCKED_OUT_USER),
        "expected the locked-out message, got {:?}",
        error
    );
    ensure!(
        pages.login.is_on_login_page().await,
        "locked out user left the login page"
    );
    Ok(())
}
