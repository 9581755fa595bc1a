//! An abstraction layer for chat-completion services.
//!
//! This crate establishes a small protocol between the conversation
//! session and the remote service answering user turns, so that the
//! session can be driven by a real provider or a scripted fake without
//! modifying the core codebase.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
