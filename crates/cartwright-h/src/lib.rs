//! Headless host: launches Chromium and drives it over the DevTools
//! protocol.

pub mod cdp;
pub mod host;

pub use cdp::{CdpClient, CdpOptions};
pub use host::{CdpHost, CdpHostFactory};
