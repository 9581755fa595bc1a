//! Message and transcript entry types.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Placeholder text that stands for a reply that has not arrived yet.
///
/// It is never written to the history store, even if some other component
/// produced a message with exactly this text.
pub const TYPING_PLACEHOLDER: &str = "Typing...";

/// Who wrote a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The person typing into the input surface.
    User,
    /// The remote assistant.
    Bot,
}

/// A message in the conversation.
///
/// This is also the record format of the persisted history.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    /// Who wrote the message.
    pub sender: Sender,
    /// Text of the message.
    pub text: String,
}

impl Message {
    /// Creates a message written by the user.
    #[inline]
    pub fn user<S: Into<String>>(text: S) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    /// Creates a message written by the bot.
    #[inline]
    pub fn bot<S: Into<String>>(text: S) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
        }
    }

    /// Returns `true` if this message may be written to the history store.
    #[inline]
    pub fn is_persistable(&self) -> bool {
        !self.text.is_empty() && self.text != TYPING_PLACEHOLDER
    }
}

/// Identity of a turn awaiting its reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TurnId(pub(crate) u64);

impl Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "turn#{}", self.0)
    }
}

/// A transient preview of an attached file.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Preview {
    /// An image, rendered inline by views that can.
    Image {
        /// File name of the image.
        name: String,
        /// Full MIME type, e.g. `image/png`.
        mime_type: String,
    },
    /// A PDF document, rendered as an icon with its name.
    Document {
        /// File name of the document.
        name: String,
    },
}

/// An entry in the rendered transcript.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Entry {
    /// A complete message.
    Message(Message),
    /// The placeholder of a bot reply that is still on its way.
    Pending(TurnId),
    /// A file preview. Previews carry no text and are never persisted.
    Preview(Preview),
}

impl Entry {
    /// Returns the message in this entry, if it is one.
    #[inline]
    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Entry::Message(msg) => Some(msg),
            _ => None,
        }
    }
}
