use chatbox_core::message::{Entry, Message, Preview, Sender};

/// A printable line of the transcript.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Line {
    /// Text written by the user.
    User(String),
    /// Text written by the bot.
    Bot(String),
    /// Placeholder for an attached file.
    Preview(String),
}

impl Line {
    /// Returns the line to print for `entry`. Pending entries have none,
    /// they are shown as a spinner instead.
    pub fn of(entry: &Entry) -> Option<Self> {
        match entry {
            Entry::Message(msg) => Some(Self::of_message(msg)),
            Entry::Pending(_) => None,
            Entry::Preview(preview) => Some(Self::of_preview(preview)),
        }
    }

    /// Returns the line to print for `msg`.
    pub fn of_message(msg: &Message) -> Self {
        match msg.sender {
            Sender::User => Line::User(msg.text.clone()),
            Sender::Bot => Line::Bot(msg.text.clone()),
        }
    }

    fn of_preview(preview: &Preview) -> Self {
        match preview {
            Preview::Image { name, .. } => Line::Preview(format!("🖼 {name}")),
            Preview::Document { name } => {
                Line::Preview(format!("📄 PDF file uploaded: {name}"))
            }
        }
    }

    /// Returns the text of the line.
    #[inline]
    pub fn text(&self) -> &str {
        match self {
            Line::User(text) | Line::Bot(text) | Line::Preview(text) => text,
        }
    }
}
