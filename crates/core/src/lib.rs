//! Core logic of a chat client: the conversation, its persisted history,
//! and the session that drives completion requests.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

pub mod attachment;
pub mod conversation;
pub mod message;
mod model_client;
mod session;
pub mod store;
pub mod transcript;

pub use session::{Session, SessionBuilder, SessionClosedError};
