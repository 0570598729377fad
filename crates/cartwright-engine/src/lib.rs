pub mod api;
pub mod config;
pub mod data;
pub mod dom;
pub mod host;
pub mod interaction;
pub mod locators;
pub mod logging;
pub mod pages;
pub mod runner;
pub mod scenarios;

pub use host::{Host, HostError};
pub use interaction::{InteractionError, Interactor};
