//! Origin-side (Telegram) abstractions: the inbound message model and the
//! port the dispatcher uses to download files and talk back to the chat.

pub mod port;
pub mod types;
