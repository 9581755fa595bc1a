use std::collections::VecDeque;
use std::fmt::{self, Debug};
use std::future::pending;

use chatbox_model::ModelRequest;
use tokio::select;
use tokio::sync::{mpsc, oneshot};

use crate::attachment::Attachment;
use crate::conversation::{Conversation, Dispatch, SubmitError};
use crate::message::{Entry, TurnId};
use crate::model_client::{
    BoxedSendRequestFuture, ModelClient, Reply, SendRequestResult,
};

#[derive(Debug)]
pub struct UserTurn {
    pub text: String,
    pub attachments: Vec<Attachment>,
}

pub enum Command {
    Submit(UserTurn),
    ClearHistory,
    Snapshot(oneshot::Sender<Vec<Entry>>),
}

impl Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Submit(turn) => f
                .debug_struct("Submit")
                .field("text", &turn.text)
                .field("attachments", &turn.attachments.len())
                .finish(),
            Command::ClearHistory => f.write_str("ClearHistory"),
            Command::Snapshot(_) => f.write_str("Snapshot"),
        }
    }
}

struct InFlight {
    turn: TurnId,
    fut: BoxedSendRequestFuture,
}

pub struct SessionState {
    conversation: Conversation,
    model_client: ModelClient,
    in_flight: Option<InFlight>,
    pending_inputs: VecDeque<UserTurn>,
    on_idle: Option<Box<dyn Fn() + Send + Sync>>,
}

impl SessionState {
    #[inline]
    pub fn new(
        conversation: Conversation,
        model_client: ModelClient,
        on_idle: Option<Box<dyn Fn() + Send + Sync>>,
    ) -> Self {
        Self {
            conversation,
            model_client,
            in_flight: None,
            pending_inputs: Default::default(),
            on_idle,
        }
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::Submit(input) => self.enqueue_user_turn(input),
            Command::ClearHistory => {
                if let Err(err) = self.conversation.clear_history() {
                    warn!("failed to delete history: {err}");
                }
            }
            Command::Snapshot(tx) => {
                tx.send(self.conversation.transcript().entries().to_vec())
                    .ok();
            }
        }
    }

    fn enqueue_user_turn(&mut self, input: UserTurn) {
        if self.in_flight.is_some() {
            // A reply is outstanding, handle the input once it arrives.
            self.pending_inputs.push_back(input);
            return;
        }
        if !self.process_input_checked(input) {
            self.process_next_input();
        }
    }

    fn process_next_input(&mut self) {
        if self.in_flight.is_some() {
            return;
        }
        while let Some(input) = self.pending_inputs.pop_front() {
            if self.process_input_checked(input) {
                return;
            }
        }
        // Nothing to process, so we can invoke the idle callback.
        if let Some(on_idle) = &self.on_idle {
            on_idle();
        }
    }

    /// Starts a turn, assuming no request is in flight. Returns `false` if
    /// the input was rejected.
    fn process_input_checked(&mut self, input: UserTurn) -> bool {
        let Dispatch { turn, prompt } = match self
            .conversation
            .submit_user_turn(&input.text, &input.attachments)
        {
            Ok(dispatch) => dispatch,
            Err(SubmitError::Empty) => {
                debug!("ignoring an empty submission");
                return false;
            }
            Err(err @ SubmitError::Busy(_)) => {
                error!("internal state is inconsistent: {err}");
                return false;
            }
        };

        let fut = self
            .model_client
            .send_request(ModelRequest::with_user_prompt(prompt));
        self.in_flight = Some(InFlight { turn, fut });
        true
    }

    fn finish_turn(&mut self, turn: TurnId, result: SendRequestResult) {
        let Reply { text, failure } = Reply::from_result(result);
        if let Err(err) = self.conversation.resolve_with(turn, text, failure) {
            warn!("discarding the reply for {turn}: {err}");
        }
        self.process_next_input();
    }
}

/// Waits for the in-flight request, forever if there is none.
///
/// Dropping this future leaves the request in its slot, so it can be
/// polled again later.
async fn next_reply(slot: &mut Option<InFlight>) -> (TurnId, SendRequestResult) {
    match slot {
        Some(in_flight) => (in_flight.turn, in_flight.fut.as_mut().await),
        None => pending().await,
    }
}

pub async fn run_session(
    mut state: SessionState,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
) {
    debug!("started");
    let mut handles_alive = true;
    loop {
        if !handles_alive && state.in_flight.is_none() {
            break;
        }

        select! {
            biased;

            (turn, result) = next_reply(&mut state.in_flight) => {
                state.in_flight = None;
                let span = trace_span!("finish turn", %turn);
                span.in_scope(|| state.finish_turn(turn, result));
            }
            cmd = cmd_rx.recv(), if handles_alive => {
                let Some(cmd) = cmd else {
                    handles_alive = false;
                    continue;
                };
                trace!("received command: {cmd:?}");
                state.handle_command(cmd);
            }
        }
    }
    debug!("will terminate");
}
