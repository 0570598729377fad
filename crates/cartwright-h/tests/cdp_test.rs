//! Headless host integration tests
//!
//! These launch a real Chromium. When none is installed the tests log the
//! launch failure and return early. Tests run sequentially via `#[serial]`.

use cartwright_engine::config::BrowserConfig;
use cartwright_engine::host::{Host, HostError};
use cartwright_engine::interaction::{InteractionError, Interactor};
use cartwright_h::{CdpHost, CdpOptions};
use serial_test::serial;
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(10);

const PAGE: &str = r#"<html><body>
<input id="name" />
<input id="locked" disabled />
<select id="sort"><option value="az">A-Z</option><option value="hilo">High-Low</option></select>
<button id="go" onclick="document.getElementById('out').textContent = 'clicked'">Go</button>
<div id="out"></div>
<div id="hidden" style="display:none">secret</div>
<div style="position:relative">
  <button id="covered">Covered</button>
  <div style="position:absolute;top:0;left:0;width:300px;height:100px;background:white"></div>
</div>
<ul><li class="item">one</li><li class="item">two</li></ul>
</body></html>"#;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::INFO)
        .try_init()
        .ok();
}

async fn launched() -> Option<CdpHost> {
    init_tracing();
    let mut host = CdpHost::new(CdpOptions::from(&BrowserConfig::default()));
    match host.launch().await {
        Ok(()) => Some(host),
        Err(e) => {
            eprintln!("Failed to launch browser (is Chromium installed?): {}", e);
            None
        }
    }
}

fn page_url() -> String {
    format!("data:text/html,{}", PAGE.replace('#', "%23"))
}

#[tokio::test]
#[serial]
async fn test_cdp_primitives() {
    let Some(mut host) = launched().await else {
        return;
    };
    host.goto_url(&page_url(), TIMEOUT).await.expect("Navigation failed");

    host.wait_for_selector_visible("#go", TIMEOUT).await.unwrap();
    host.click_selector("#go", false).await.unwrap();
    assert_eq!(
        host.read_text_content("#out").await.unwrap(),
        Some("clicked".to_string())
    );

    host.fill_selector("#name", "John", false).await.unwrap();
    host.select_option("#sort", "hilo").await.unwrap();
    assert!(matches!(
        host.select_option("#sort", "nope").await,
        Err(HostError::OptionNotFound { .. })
    ));

    assert!(!host.query_visibility("#hidden").await.unwrap());
    assert!(!host.query_visibility("#absent").await.unwrap());
    assert_eq!(
        host.read_all_text_contents("//li[@class='item']").await.unwrap(),
        vec!["one", "two"]
    );

    host.close().await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_cdp_actionability_and_force() {
    let Some(mut host) = launched().await else {
        return;
    };
    host.goto_url(&page_url(), TIMEOUT).await.unwrap();

    assert!(matches!(
        host.click_selector("#covered", false).await,
        Err(HostError::ElementNotInteractable { .. })
    ));
    host.click_selector("#covered", true).await.unwrap();

    assert!(matches!(
        host.fill_selector("#locked", "x", false).await,
        Err(HostError::ElementNotInteractable { .. })
    ));

    host.close().await.unwrap();
}

#[tokio::test]
#[serial]
async fn test_interactor_over_cdp() {
    let Some(host) = launched().await else {
        return;
    };
    let host: Arc<dyn Host> = Arc::new(host);
    let ui = Interactor::new(host.clone());

    ui.navigate(&page_url()).await.unwrap();
    // The overlay blocks the plain click; the forced retry goes through.
    ui.click("#covered").await.unwrap();
    assert!(!ui.is_visible("#hidden").await);

    let err = ui
        .wait_for_visible_within("#hidden", Duration::from_millis(300))
        .await
        .unwrap_err();
    assert!(matches!(err, InteractionError::ElementNotFound { attempts: 3, .. }));

    drop(ui);
    let mut host = host;
    if let Some(host) = Arc::get_mut(&mut host) {
        host.close().await.unwrap();
    }
}
