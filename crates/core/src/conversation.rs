//! The conversation state: transcript, pending turn, and persistence.

use std::error::Error;
use std::fmt::{self, Display};

use chatbox_model::ErrorKind;

use crate::attachment::Attachment;
use crate::message::{Entry, Message, TurnId};
use crate::store::{HISTORY_KEY, HistoryStore, StoreError};
use crate::transcript::{NullView, Transcript, TranscriptView};

/// Text shown in place of a reply that could not be obtained.
pub const FAILURE_SENTINEL: &str = "⚠️ Network or API error occurred.";

/// The completion request to send for a submitted turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dispatch {
    /// The turn whose pending entry the reply resolves.
    pub turn: TurnId,
    /// The sole user turn to send to the remote service.
    pub prompt: String,
}

/// Why a submission was not accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitError {
    /// Neither text nor attachments were given.
    Empty,
    /// Another turn is still waiting for its reply.
    Busy(TurnId),
}

impl Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::Empty => "nothing to submit".fmt(f),
            SubmitError::Busy(turn) => {
                write!(f, "{turn} is still waiting for a reply")
            }
        }
    }
}

impl Error for SubmitError {}

/// Why a reply could not be applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolveError {
    /// No turn is waiting for a reply, e.g. the history was cleared while
    /// the request was in flight.
    NoPendingTurn,
    /// Another turn is the pending one.
    TurnMismatch {
        /// The turn that is actually pending.
        pending: TurnId,
        /// The turn the reply was meant for.
        given: TurnId,
    },
}

impl Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::NoPendingTurn => "no turn is pending".fmt(f),
            ResolveError::TurnMismatch { pending, given } => {
                write!(f, "reply for {given}, but {pending} is pending")
            }
        }
    }
}

impl Error for ResolveError {}

/// What [`Conversation::restore`] found in the store.
#[derive(Debug)]
pub enum RestoreOutcome {
    /// Nothing was stored.
    Empty,
    /// This many messages were restored.
    Restored(usize),
    /// The stored value could not be parsed. The conversation starts empty.
    Malformed(String),
    /// The store could not be read. The conversation starts empty.
    Unavailable(StoreError),
}

/// A conversation, as rendered and as persisted.
///
/// All mutations go through this type, which keeps the transcript, the
/// view and the history store consistent with each other. At most one turn
/// is pending at a time.
pub struct Conversation {
    transcript: Transcript,
    store: Box<dyn HistoryStore>,
    view: Box<dyn TranscriptView>,
    next_turn: u64,
}

impl Conversation {
    /// Creates an empty conversation backed by `store`. Nothing is read
    /// from the store until [`Conversation::restore`] is called.
    pub fn new(store: impl HistoryStore + 'static) -> Self {
        Self::from_parts(Box::new(store), Box::new(NullView))
    }

    pub(crate) fn from_parts(
        store: Box<dyn HistoryStore>,
        view: Box<dyn TranscriptView>,
    ) -> Self {
        Self {
            transcript: Transcript::default(),
            store,
            view,
            next_turn: 1,
        }
    }

    /// Renders all future mutations into `view`.
    pub fn with_view(mut self, view: impl TranscriptView + 'static) -> Self {
        self.view = Box::new(view);
        self
    }

    /// Returns the rendered entries.
    #[inline]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Returns the turn waiting for its reply, if any.
    #[inline]
    pub fn pending_turn(&self) -> Option<TurnId> {
        self.transcript.pending_turn()
    }

    /// Records a user turn and returns the request to send for it.
    ///
    /// The text is trimmed. Each attachment adds a summary message and,
    /// for images and PDFs, a preview. The history is persisted before the
    /// pending entry is appended.
    pub fn submit_user_turn(
        &mut self,
        text: &str,
        attachments: &[Attachment],
    ) -> Result<Dispatch, SubmitError> {
        let text = text.trim();
        if text.is_empty() && attachments.is_empty() {
            return Err(SubmitError::Empty);
        }
        if let Some(turn) = self.pending_turn() {
            return Err(SubmitError::Busy(turn));
        }

        if !text.is_empty() {
            self.append(Entry::Message(Message::user(text)));
        }
        let mut summaries = Vec::with_capacity(attachments.len());
        for attachment in attachments {
            let summary = attachment.summary();
            self.append(Entry::Message(Message::user(summary.clone())));
            if let Some(preview) = attachment.preview() {
                self.append(Entry::Preview(preview));
            }
            summaries.push(summary);
        }
        self.persist_or_warn();

        let turn = TurnId(self.next_turn);
        self.next_turn += 1;
        self.append(Entry::Pending(turn));

        let prompt = if text.is_empty() {
            summaries.join("\n")
        } else {
            text.to_owned()
        };
        debug!("dispatching {turn}");
        Ok(Dispatch { turn, prompt })
    }

    /// Replaces the pending entry of `turn` with a bot message and
    /// persists.
    pub fn resolve_bot_turn<S: Into<String>>(
        &mut self,
        turn: TurnId,
        text: S,
    ) -> Result<(), ResolveError> {
        self.resolve_with(turn, text.into(), None)
    }

    pub(crate) fn resolve_with(
        &mut self,
        turn: TurnId,
        text: String,
        failure: Option<ErrorKind>,
    ) -> Result<(), ResolveError> {
        match self.pending_turn() {
            None => return Err(ResolveError::NoPendingTurn),
            Some(pending) if pending != turn => {
                return Err(ResolveError::TurnMismatch {
                    pending,
                    given: turn,
                });
            }
            Some(_) => {}
        }

        let text = if text.is_empty() {
            FAILURE_SENTINEL.to_owned()
        } else {
            text
        };
        let message = Message::bot(text);
        self.transcript.replace_pending(turn, message.clone());
        self.view.resolved(turn, &message, failure);
        debug!("resolved {turn}");

        self.persist_or_warn();
        Ok(())
    }

    /// Writes every persistable message to the store, replacing the
    /// previously stored history.
    pub fn persist(&self) -> Result<(), StoreError> {
        let messages: Vec<&Message> = self
            .transcript
            .messages()
            .filter(|msg| msg.is_persistable())
            .collect();
        let value = serde_json::to_string(&messages)
            .map_err(|err| StoreError::new(HISTORY_KEY, err.into()))?;
        self.store.save(HISTORY_KEY, &value)?;
        trace!("persisted {} messages", messages.len());
        Ok(())
    }

    /// Replaces the transcript with the stored history.
    ///
    /// A pending turn, if any, is dropped along with the rest of the
    /// transcript. Absent, unreadable or malformed history yields an empty
    /// conversation.
    pub fn restore(&mut self) -> RestoreOutcome {
        if !self.transcript.is_empty() {
            self.transcript.clear();
            self.view.cleared();
        }

        let value = match self.store.load(HISTORY_KEY) {
            Ok(Some(value)) => value,
            Ok(None) => return RestoreOutcome::Empty,
            Err(err) => {
                warn!("failed to load history: {err}");
                return RestoreOutcome::Unavailable(err);
            }
        };
        let messages = match serde_json::from_str::<Vec<Message>>(&value) {
            Ok(messages) => messages,
            Err(err) => {
                warn!("discarding malformed history: {err}");
                return RestoreOutcome::Malformed(err.to_string());
            }
        };

        let mut count = 0;
        for message in messages.into_iter().filter(Message::is_persistable) {
            self.append(Entry::Message(message));
            count += 1;
        }
        debug!("restored {count} messages");
        RestoreOutcome::Restored(count)
    }

    /// Empties the transcript and deletes the stored history.
    pub fn clear_history(&mut self) -> Result<(), StoreError> {
        self.transcript.clear();
        self.view.cleared();
        self.store.remove(HISTORY_KEY)
    }

    fn append(&mut self, entry: Entry) {
        self.view.appended(&entry);
        self.transcript.push(entry);
    }

    fn persist_or_warn(&self) {
        if let Err(err) = self.persist() {
            warn!("failed to persist history: {err}");
        }
    }
}
