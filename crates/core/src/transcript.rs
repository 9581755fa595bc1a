//! The ordered list of rendered entries, and the view that displays it.

use chatbox_model::ErrorKind;

use crate::message::{Entry, Message, TurnId};

/// A rendering surface for the transcript.
///
/// The conversation calls these hooks right after it mutates its own
/// transcript, in the same order. Views are expected to keep the latest
/// entry visible after every append.
pub trait TranscriptView: Send {
    /// An entry was appended at the end of the transcript.
    fn appended(&mut self, entry: &Entry);

    /// The pending entry of `turn` was replaced by `message`. `failure` is
    /// set when the message is the rendering of a failed request.
    fn resolved(
        &mut self,
        turn: TurnId,
        message: &Message,
        failure: Option<ErrorKind>,
    ) {
        let _ = (turn, message, failure);
    }

    /// All entries were removed.
    fn cleared(&mut self) {}
}

/// A view that renders nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullView;

impl TranscriptView for NullView {
    #[inline]
    fn appended(&mut self, _entry: &Entry) {}
}

/// The entries of a conversation, in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Transcript {
    entries: Vec<Entry>,
}

impl Transcript {
    /// Returns all entries in order.
    #[inline]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the complete messages, skipping pending entries and
    /// previews.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter().filter_map(Entry::as_message)
    }

    /// Returns the turn of the pending entry, if any.
    pub fn pending_turn(&self) -> Option<TurnId> {
        self.entries.iter().rev().find_map(|entry| match entry {
            Entry::Pending(turn) => Some(*turn),
            _ => None,
        })
    }

    #[inline]
    pub(crate) fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// Replaces the pending entry of `turn` in place. Returns `false` if
    /// there is no such entry.
    pub(crate) fn replace_pending(&mut self, turn: TurnId, message: Message) -> bool {
        let Some(entry) = self
            .entries
            .iter_mut()
            .rev()
            .find(|entry| **entry == Entry::Pending(turn))
        else {
            return false;
        };
        *entry = Entry::Message(message);
        true
    }

    #[inline]
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
