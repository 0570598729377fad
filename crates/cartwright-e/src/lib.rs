//! WebDriver host: drives any browser behind a W3C WebDriver endpoint
//! (chromedriver, geckodriver, a Selenium grid).

pub mod host;
pub mod webdriver;

pub use host::{WebDriverHost, WebDriverHostFactory};
pub use webdriver::{WebDriverClient, WebDriverOptions};
