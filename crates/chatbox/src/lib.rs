//! A terminal chat client that talks to an OpenAI-compatible completion
//! service.
//!
//! The crate includes a CLI tool for using in the terminal. The pieces it is
//! made of are exposed too, so another front end can reuse them.

#![deny(missing_docs)]

#[allow(unused_imports)]
#[macro_use]
extern crate tracing;

mod attach;
mod command;
mod input;
mod render;
mod view;

pub use attach::{AttachError, load_attachment};
pub use command::InputCommand;
pub use input::read_line;
pub use render::Line;
pub use view::{CallbackView, ViewEvent};

/// Re-exports of [`chatbox_core`] crate.
pub mod core {
    pub use chatbox_core::*;
}
