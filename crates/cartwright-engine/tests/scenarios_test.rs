mod storefront;

use cartwright_engine::pages::Pages;
use cartwright_engine::scenarios::{self, ScenarioError};
use std::sync::Arc;
use storefront::Storefront;

#[tokio::test(start_paused = true)]
async fn test_every_scenario_passes_against_storefront() {
    for scenario in scenarios::all() {
        let store = Arc::new(Storefront::new());
        let pages = Pages::new(store.interactor());
        let result = (scenario.run)(&pages).await;
        assert!(result.is_ok(), "{}: {:?}", scenario.title(), result);
    }
}

#[tokio::test(start_paused = true)]
async fn test_scenario_reports_unreachable_storefront() {
    let store = Arc::new(Storefront::new());
    store.fail_navigations(3);
    let pages = Pages::new(store.interactor());

    let err = scenarios::login_as_standard_user(&pages).await.unwrap_err();
    assert!(matches!(err, ScenarioError::Page(_)));
    assert!(err.to_string().contains("after 3 attempts"));
}

#[test]
fn test_suites_are_registered() {
    let all = scenarios::all();
    let suites: Vec<&str> = all.iter().map(|s| s.suite).collect();
    assert!(suites.contains(&"Login"));
    assert!(suites.contains(&"Complete Purchase Flow"));
    assert!(suites.contains(&"Shopping Cart Workflows"));
    assert_eq!(all.len(), 8);
}

#[test]
fn test_select_filters_by_suite_or_name() {
    assert_eq!(scenarios::select(None).len(), scenarios::all().len());

    let purchase = scenarios::select(Some("purchase flow"));
    assert_eq!(purchase.len(), 2);
    assert!(purchase.iter().all(|s| s.suite == "Complete Purchase Flow"));

    let sorting = scenarios::select(Some("SORT"));
    assert_eq!(sorting.len(), 2);

    assert!(scenarios::select(Some("no such scenario")).is_empty());
}

#[test]
fn test_scenario_title() {
    let first = scenarios::all()[0];
    assert_eq!(first.title(), format!("{} › {}", first.suite, first.name));
}
