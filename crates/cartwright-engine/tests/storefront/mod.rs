//! An in-memory stand-in for the storefront that answers the same
//! selectors the page objects use.

#![allow(dead_code)]

use async_trait::async_trait;
use cartwright_engine::data::{Price, Product, SortOrder, messages, products, users};
use cartwright_engine::host::{Host, HostError, poll_until};
use cartwright_engine::interaction::Interactor;
use cartwright_engine::locators::{cart, checkout, common, inventory, login};
use cartwright_engine::runner::HostFactory;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

pub const BASE_URL: &str = "https://www.saucedemo.com";

/// What `screenshot` hands back: a PNG signature.
pub const SCREENSHOT_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n";

const BAD_CREDENTIALS: &str =
    "Epic sadface: Username and password do not match any user in this service";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Blank,
    Login,
    Inventory,
    Cart,
    CheckoutInfo,
    CheckoutOverview,
    Complete,
}

impl Screen {
    fn path(&self) -> &'static str {
        match self {
            Screen::Blank => "about:blank",
            Screen::Login => "/",
            Screen::Inventory => "/inventory.html",
            Screen::Cart => "/cart.html",
            Screen::CheckoutInfo => "/checkout-step-one.html",
            Screen::CheckoutOverview => "/checkout-step-two.html",
            Screen::Complete => "/checkout-complete.html",
        }
    }
}

#[derive(Debug)]
struct State {
    screen: Screen,
    cart: Vec<&'static str>,
    sort: SortOrder,
    fields: HashMap<String, String>,
    error: Option<String>,
    cart_changed: Instant,
    badge_delay: Duration,
    unpriced: HashSet<&'static str>,
}

/// Scripted storefront. Plain clicks on `obscured` selectors fail the way
/// an overlapped element does; forced ones go through.
pub struct Storefront {
    state: Mutex<State>,
    obscured: Mutex<HashSet<String>>,
    navigation_failures: Mutex<u32>,
    forced_clicks: AtomicUsize,
    launched: AtomicUsize,
    closed: Arc<AtomicUsize>,
    screenshots: bool,
}

impl Default for Storefront {
    fn default() -> Self {
        Self::new()
    }
}

impl Storefront {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                screen: Screen::Blank,
                cart: Vec::new(),
                sort: SortOrder::NameAscending,
                fields: HashMap::new(),
                error: None,
                cart_changed: Instant::now(),
                badge_delay: Duration::ZERO,
                unpriced: HashSet::new(),
            }),
            obscured: Mutex::new(HashSet::new()),
            navigation_failures: Mutex::new(0),
            forced_clicks: AtomicUsize::new(0),
            launched: AtomicUsize::new(0),
            closed: Arc::new(AtomicUsize::new(0)),
            screenshots: true,
        }
    }

    /// Re-render the cart badge only `delay` after the cart changes.
    pub fn delay_badge(&self, delay: Duration) {
        self.state.lock().unwrap().badge_delay = delay;
    }

    /// Render `product`'s card without its price element.
    pub fn drop_price(&self, product: Product) {
        self.state.lock().unwrap().unpriced.insert(product.name);
    }

    pub fn obscure(&self, selector: &str) {
        self.obscured.lock().unwrap().insert(selector.to_string());
    }

    pub fn fail_navigations(&self, count: u32) {
        *self.navigation_failures.lock().unwrap() = count;
    }

    pub fn screen(&self) -> Screen {
        self.state.lock().unwrap().screen
    }

    pub fn cart(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().cart.clone()
    }

    pub fn forced_clicks(&self) -> usize {
        self.forced_clicks.load(Ordering::SeqCst)
    }

    pub fn interactor(self: &Arc<Self>) -> Interactor {
        Interactor::new(self.clone()).with_base_url(Url::parse(BASE_URL).unwrap())
    }

    fn find(name: &str) -> Option<Product> {
        products::CATALOGUE.iter().copied().find(|p| p.name == name)
    }

    fn listed(state: &State) -> Vec<Product> {
        let mut listed = products::CATALOGUE.to_vec();
        match state.sort {
            SortOrder::NameAscending => listed.sort_by(|a, b| a.name.cmp(b.name)),
            SortOrder::NameDescending => listed.sort_by(|a, b| b.name.cmp(a.name)),
            SortOrder::PriceLowToHigh => listed.sort_by_key(|p| p.price),
            SortOrder::PriceHighToLow => listed.sort_by(|a, b| b.price.cmp(&a.price)),
        }
        listed
    }

    fn total(state: &State) -> Price {
        let subtotal: Price = state
            .cart
            .iter()
            .filter_map(|name| Self::find(name))
            .map(|p| p.price)
            .sum();
        let tax = (subtotal.cents() * 8 + 50) / 100;
        subtotal + Price::from_cents(tax)
    }

    /// The product a per-item selector refers to, if any.
    fn product_for(selector: &str, builder: fn(&str) -> String) -> Option<Product> {
        products::CATALOGUE
            .iter()
            .copied()
            .find(|p| builder(p.name) == selector)
    }

    fn is_visible(state: &State, selector: &str) -> bool {
        let in_cart = |p: &Product| state.cart.contains(&p.name);
        let badge = selector == common::CART_BADGE
            && !state.cart.is_empty()
            && state.cart_changed.elapsed() >= state.badge_delay;
        let error = selector == common::ERROR_MESSAGE && state.error.is_some();

        match state.screen {
            Screen::Blank => false,
            Screen::Login => {
                [login::USERNAME_INPUT, login::PASSWORD_INPUT, login::LOGIN_BUTTON]
                    .contains(&selector)
                    || error
            }
            Screen::Inventory => {
                [
                    inventory::CONTAINER,
                    inventory::SORT_DROPDOWN,
                    inventory::ITEM_NAME,
                    inventory::ITEM_PRICE,
                    inventory::CART_LINK,
                ]
                .contains(&selector)
                    || badge
                    || Self::product_for(selector, inventory::add_to_cart_button)
                        .is_some_and(|p| !in_cart(&p))
                    || Self::product_for(selector, inventory::remove_button).is_some_and(|p| in_cart(&p))
                    || Self::product_for(selector, inventory::item_price)
                        .is_some_and(|p| !state.unpriced.contains(p.name))
            }
            Screen::Cart => {
                [cart::CHECKOUT_BUTTON, inventory::CART_LINK].contains(&selector)
                    || badge
                    || Self::product_for(selector, cart::cart_item).is_some_and(|p| in_cart(&p))
                    || Self::product_for(selector, cart::item_price).is_some_and(|p| in_cart(&p))
            }
            Screen::CheckoutInfo => {
                [
                    checkout::FIRST_NAME_INPUT,
                    checkout::LAST_NAME_INPUT,
                    checkout::POSTAL_CODE_INPUT,
                    checkout::CONTINUE_BUTTON,
                ]
                .contains(&selector)
                    || error
            }
            Screen::CheckoutOverview => {
                [checkout::TOTAL_PRICE, checkout::FINISH_BUTTON].contains(&selector)
            }
            Screen::Complete => selector == checkout::COMPLETE_HEADER,
        }
    }

    fn require_visible(state: &State, selector: &str) -> Result<(), HostError> {
        if Self::is_visible(state, selector) {
            Ok(())
        } else {
            Err(HostError::ElementNotFound {
                selector: selector.to_string(),
            })
        }
    }

    fn field(state: &State, selector: &str) -> String {
        state.fields.get(selector).cloned().unwrap_or_default()
    }

    fn press(state: &mut State, selector: &str) {
        if selector == login::LOGIN_BUTTON {
            let username = Self::field(state, login::USERNAME_INPUT);
            let password = Self::field(state, login::PASSWORD_INPUT);
            if username == users::LOCKED_OUT.username {
                state.error = Some(messages::LOCKED_OUT_USER.to_string());
            } else if username == users::STANDARD.username && password == users::STANDARD.password {
                state.error = None;
                state.screen = Screen::Inventory;
            } else {
                state.error = Some(BAD_CREDENTIALS.to_string());
            }
        } else if let Some(p) = Self::product_for(selector, inventory::add_to_cart_button) {
            state.cart.push(p.name);
            state.cart_changed = Instant::now();
        } else if let Some(p) = Self::product_for(selector, inventory::remove_button) {
            state.cart.retain(|name| *name != p.name);
            state.cart_changed = Instant::now();
        } else if selector == inventory::CART_LINK {
            state.screen = Screen::Cart;
        } else if selector == cart::CHECKOUT_BUTTON {
            state.fields.clear();
            state.screen = Screen::CheckoutInfo;
        } else if selector == checkout::CONTINUE_BUTTON {
            let missing = [
                (checkout::FIRST_NAME_INPUT, messages::FIRST_NAME_REQUIRED),
                (checkout::LAST_NAME_INPUT, messages::LAST_NAME_REQUIRED),
                (checkout::POSTAL_CODE_INPUT, messages::POSTAL_CODE_REQUIRED),
            ]
            .into_iter()
            .find(|(input, _)| Self::field(state, input).is_empty());
            match missing {
                Some((_, message)) => state.error = Some(message.to_string()),
                None => {
                    state.error = None;
                    state.screen = Screen::CheckoutOverview;
                }
            }
        } else if selector == checkout::FINISH_BUTTON {
            state.cart.clear();
            state.screen = Screen::Complete;
        }
    }

    fn text_of(state: &State, selector: &str) -> Option<String> {
        if selector == common::CART_BADGE {
            return Some(state.cart.len().to_string());
        }
        if selector == common::ERROR_MESSAGE {
            return state.error.clone();
        }
        if selector == checkout::TOTAL_PRICE {
            return Some(format!("Total: {}", Self::total(state)));
        }
        if selector == checkout::COMPLETE_HEADER {
            return Some(messages::ORDER_CONFIRMATION.to_string());
        }
        Self::product_for(selector, inventory::item_price)
            .or_else(|| Self::product_for(selector, cart::item_price))
            .map(|p| p.price.to_string())
    }
}

#[async_trait]
impl Host for Storefront {
    async fn launch(&mut self) -> Result<(), HostError> {
        self.launched.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), HostError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        self.launched.load(Ordering::SeqCst) > 0
    }

    async fn goto_url(&self, url: &str, _timeout: Duration) -> Result<(), HostError> {
        {
            let mut failures = self.navigation_failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(HostError::Navigation("net::ERR_CONNECTION_RESET".into()));
            }
        }
        let parsed = Url::parse(url).map_err(|e| HostError::Navigation(e.to_string()))?;
        let mut state = self.state.lock().unwrap();
        state.error = None;
        state.screen = match parsed.path() {
            "/" => Screen::Login,
            "/inventory.html" => Screen::Inventory,
            "/cart.html" => Screen::Cart,
            other => return Err(HostError::Navigation(format!("404 for {}", other))),
        };
        Ok(())
    }

    async fn wait_for_selector_visible(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), HostError> {
        poll_until(timeout, &format!("wait for {}", selector), || async {
            Ok(Self::is_visible(&self.state.lock().unwrap(), selector))
        })
        .await
    }

    async fn click_selector(&self, selector: &str, force: bool) -> Result<(), HostError> {
        let mut state = self.state.lock().unwrap();
        Self::require_visible(&state, selector)?;
        if force {
            self.forced_clicks.fetch_add(1, Ordering::SeqCst);
        } else if self.obscured.lock().unwrap().contains(selector) {
            return Err(HostError::ElementNotInteractable {
                selector: selector.to_string(),
                reason: "obscured by <div>".into(),
            });
        }
        Self::press(&mut state, selector);
        Ok(())
    }

    async fn fill_selector(&self, selector: &str, value: &str, _force: bool) -> Result<(), HostError> {
        let mut state = self.state.lock().unwrap();
        Self::require_visible(&state, selector)?;
        state.fields.insert(selector.to_string(), value.to_string());
        Ok(())
    }

    async fn read_text_content(&self, selector: &str) -> Result<Option<String>, HostError> {
        let state = self.state.lock().unwrap();
        Self::require_visible(&state, selector)?;
        Ok(Self::text_of(&state, selector))
    }

    async fn query_visibility(&self, selector: &str) -> Result<bool, HostError> {
        Ok(Self::is_visible(&self.state.lock().unwrap(), selector))
    }

    async fn read_all_text_contents(&self, selector: &str) -> Result<Vec<String>, HostError> {
        let state = self.state.lock().unwrap();
        if state.screen != Screen::Inventory {
            return Ok(vec![]);
        }
        let listed = Self::listed(&state);
        Ok(match selector {
            inventory::ITEM_NAME => listed.iter().map(|p| p.name.to_string()).collect(),
            inventory::ITEM_PRICE => listed
                .iter()
                .filter(|p| !state.unpriced.contains(p.name))
                .map(|p| p.price.to_string())
                .collect(),
            _ => vec![],
        })
    }

    async fn select_option(&self, selector: &str, value: &str) -> Result<(), HostError> {
        let mut state = self.state.lock().unwrap();
        Self::require_visible(&state, selector)?;
        state.sort = value.parse().map_err(|_| HostError::OptionNotFound {
            value: value.to_string(),
        })?;
        Ok(())
    }

    async fn current_url(&self) -> Result<String, HostError> {
        let screen = self.state.lock().unwrap().screen;
        Ok(match screen {
            Screen::Blank => screen.path().to_string(),
            _ => format!("{}{}", BASE_URL, screen.path()),
        })
    }

    async fn screenshot(&self) -> Result<Vec<u8>, HostError> {
        if self.screenshots {
            Ok(SCREENSHOT_BYTES.to_vec())
        } else {
            Err(HostError::NotSupported("screenshot".into()))
        }
    }
}

/// Hands every scenario attempt a fresh storefront and counts them.
#[derive(Default)]
pub struct StorefrontFactory {
    pub created: AtomicUsize,
    pub closed: Arc<AtomicUsize>,
    pub without_screenshots: bool,
}

#[async_trait]
impl HostFactory for StorefrontFactory {
    async fn create(&self) -> Result<Box<dyn Host>, HostError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        let mut storefront = Storefront::new();
        storefront.closed = self.closed.clone();
        storefront.screenshots = !self.without_screenshots;
        Ok(Box::new(storefront))
    }
}
