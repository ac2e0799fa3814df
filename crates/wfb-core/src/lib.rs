//! Core domain + application logic for the WhatsApp forwarder bot.
//!
//! This crate is intentionally framework-agnostic. Telegram, the WhatsApp
//! gateway and the HTTP status page live behind ports (traits) implemented in
//! adapter crates.

pub mod config;
pub mod connectivity;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod messaging;
pub mod payload;
pub mod ports;
pub mod relay;
pub mod status;
pub mod supervisor;
pub mod thumbnail;

pub use errors::{Error, Result};
