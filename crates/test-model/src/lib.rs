//! A local fake model for testing purpose.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chatbox_model::{
    ErrorKind, ModelMessage, ModelProvider, ModelProviderError, ModelRequest,
    ModelResponse,
};
use tokio::time::sleep;

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
    remote_message: Option<String>,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    fn remote_message(&self) -> Option<&str> {
        self.remote_message.as_deref()
    }
}

#[derive(Default)]
struct Script {
    replies: VecDeque<PresetReply>,
    received: Vec<ModelRequest>,
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the script, which is how the
/// model should respond to each request. Replies are consumed in order, one
/// per request. If the script runs out of replies, a network error is
/// returned.
///
/// Clones share the same script, so a test can keep one clone around to
/// inspect the requests the other one received.
///
/// # Note
///
/// This type is not optimized for production use. You should only use it
/// for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    script: Arc<Mutex<Script>>,
    delay: Option<Duration>,
}

impl TestModelProvider {
    #[inline]
    pub fn add_reply(&mut self, reply: PresetReply) {
        self.lock().replies.push_back(reply);
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns the user prompts of all requests received so far.
    pub fn received_prompts(&self) -> Vec<String> {
        self.lock()
            .received
            .iter()
            .flat_map(|req| &req.messages)
            .map(|ModelMessage::User(text)| text.clone())
            .collect()
    }

    /// Returns the number of requests received so far.
    pub fn request_count(&self) -> usize {
        self.lock().received.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelResponse, Self::Error>> + Send + 'static
    {
        let reply = {
            let mut script = self.lock();
            script.received.push(req.clone());
            script.replies.pop_front()
        };
        let delay = self.delay.unwrap_or(Duration::from_millis(1));

        async move {
            sleep(delay).await;
            match reply {
                Some(PresetReply::Text {
                    content,
                    finish_reason,
                }) => Ok(ModelResponse {
                    content,
                    finish_reason,
                }),
                Some(PresetReply::Failure {
                    kind,
                    remote_message,
                }) => Err(Error {
                    message: "preset failure".to_owned(),
                    kind,
                    remote_message,
                }),
                None => Err(Error {
                    message: "not enough replies".to_owned(),
                    kind: ErrorKind::Network,
                    remote_message: None,
                }),
            }
        }
    }
}
