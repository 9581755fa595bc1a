use chatbox_core::message::{Entry, Message, TurnId};
use chatbox_core::transcript::TranscriptView;
use chatbox_model::ErrorKind;

/// A change to the transcript, as observed by a [`CallbackView`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewEvent {
    /// An entry was appended.
    Appended(Entry),
    /// The pending entry of a turn was replaced.
    Resolved {
        /// The turn that got its reply.
        turn: TurnId,
        /// The bot message now standing in place of the pending entry.
        message: Message,
        /// Set when the message renders a failed request.
        failure: Option<ErrorKind>,
    },
    /// The transcript was emptied.
    Cleared,
}

/// A view that hands every transcript change to a callback.
///
/// The session task renders into its view, so the callback runs on that
/// task. Forwarding into a channel keeps the actual drawing on the UI side.
pub struct CallbackView<F> {
    on_event: F,
}

impl<F> CallbackView<F>
where
    F: FnMut(ViewEvent) + Send,
{
    /// Creates a view that invokes `on_event` for each change.
    #[inline]
    pub fn new(on_event: F) -> Self {
        Self { on_event }
    }
}

impl<F> TranscriptView for CallbackView<F>
where
    F: FnMut(ViewEvent) + Send,
{
    fn appended(&mut self, entry: &Entry) {
        (self.on_event)(ViewEvent::Appended(entry.clone()));
    }

    fn resolved(
        &mut self,
        turn: TurnId,
        message: &Message,
        failure: Option<ErrorKind>,
    ) {
        (self.on_event)(ViewEvent::Resolved {
            turn,
            message: message.clone(),
            failure,
        });
    }

    fn cleared(&mut self) {
        (self.on_event)(ViewEvent::Cleared);
    }
}
