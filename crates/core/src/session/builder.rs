use std::sync::Arc;

use chatbox_model::ModelProvider;
use tokio::sync::mpsc;
use tracing::Instrument;

use super::Session;
use super::state::{SessionState, run_session};
use crate::conversation::{Conversation, RestoreOutcome};
use crate::model_client::ModelClient;
use crate::store::{HistoryStore, MemoryStore};
use crate::transcript::{NullView, TranscriptView};

/// [`Session`] builder.
pub struct SessionBuilder {
    pub(crate) model_client: ModelClient,
    pub(crate) store: Box<dyn HistoryStore>,
    pub(crate) view: Box<dyn TranscriptView>,
    pub(crate) on_idle: Option<Box<dyn Fn() + Send + Sync>>,
}

impl SessionBuilder {
    /// Creates a new builder with the specified model provider.
    ///
    /// Unless configured otherwise, history is kept in memory only and
    /// nothing is rendered.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            store: Box::new(MemoryStore::default()),
            view: Box::new(NullView),
            on_idle: None,
        }
    }

    /// Sets the store the history is restored from and persisted to.
    #[inline]
    pub fn with_store(mut self, store: impl HistoryStore + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    /// Sets the view that renders the transcript.
    #[inline]
    pub fn with_view(mut self, view: impl TranscriptView + 'static) -> Self {
        self.view = Box::new(view);
        self
    }

    /// Attaches a callback to be invoked when the session has resolved
    /// every submitted turn.
    #[inline]
    pub fn on_idle(
        mut self,
        on_idle: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.on_idle = Some(Box::new(on_idle));
        self
    }

    /// Restores the stored history into the view and starts the session.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn build(self) -> Session {
        let SessionBuilder {
            model_client,
            store,
            view,
            on_idle,
        } = self;

        let mut conversation = Conversation::from_parts(store, view);
        let restore_outcome = conversation.restore();
        if let RestoreOutcome::Restored(count) = &restore_outcome {
            info!("restored {count} messages from history");
        }

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let state = SessionState::new(conversation, model_client, on_idle);
        tokio::spawn(run_session(state, cmd_rx).instrument(trace_span!("session")));

        Session {
            cmd_tx,
            restore_outcome: Arc::new(restore_outcome),
        }
    }
}
