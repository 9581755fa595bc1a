mod builder;
mod state;
#[cfg(test)]
mod tests;

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::attachment::Attachment;
use crate::conversation::RestoreOutcome;
use crate::message::Entry;
pub use builder::SessionBuilder;
use state::{Command, UserTurn};

/// A type of error which can be returned whenever commands are sent to
/// a session whose driver task has stopped.
pub struct SessionClosedError;

impl fmt::Debug for SessionClosedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionClosedError").finish()
    }
}

impl fmt::Display for SessionClosedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        "the session has been closed".fmt(f)
    }
}

impl Error for SessionClosedError {}

/// Handle to a running conversation session.
///
/// The session is driven by a background task that owns the conversation,
/// its history store and its view. Commands sent through this handle are
/// handled in order. Only one completion request is in flight at a time;
/// turns submitted meanwhile are queued and dispatched first-in, first-out
/// once the outstanding reply has been rendered.
///
/// Dropping every handle doesn't abandon the outstanding request, the task
/// stops after all submitted turns have been resolved.
#[derive(Clone)]
pub struct Session {
    cmd_tx: mpsc::UnboundedSender<Command>,
    restore_outcome: Arc<RestoreOutcome>,
}

impl Session {
    /// Submits a user turn with optional attachments.
    ///
    /// Submissions with blank text and no attachments are ignored.
    pub fn submit_user_turn<S: Into<String>>(
        &self,
        text: S,
        attachments: Vec<Attachment>,
    ) -> Result<(), SessionClosedError> {
        self.send(Command::Submit(UserTurn {
            text: text.into(),
            attachments,
        }))
    }

    /// Empties the transcript and deletes the stored history.
    ///
    /// A reply that is still on its way when the history is cleared gets
    /// discarded. Queued turns are kept.
    #[inline]
    pub fn clear_history(&self) -> Result<(), SessionClosedError> {
        self.send(Command::ClearHistory)
    }

    /// Returns a copy of the current transcript entries.
    pub async fn snapshot(&self) -> Result<Vec<Entry>, SessionClosedError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx))?;
        rx.await.map_err(|_| SessionClosedError)
    }

    /// Returns what was found in the history store when the session
    /// started.
    #[inline]
    pub fn restore_outcome(&self) -> &RestoreOutcome {
        &self.restore_outcome
    }

    #[inline]
    fn send(&self, cmd: Command) -> Result<(), SessionClosedError> {
        self.cmd_tx.send(cmd).map_err(|_| SessionClosedError)
    }
}
