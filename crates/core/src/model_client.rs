use std::pin::Pin;
use std::sync::Arc;

use chatbox_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse,
};
use tracing::Instrument;

use crate::conversation::FAILURE_SENTINEL;

pub(crate) type SendRequestResult =
    Result<ModelResponse, Box<dyn ModelProviderError>>;
pub(crate) type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
type HandlerFn =
    Arc<dyn Fn(ModelRequest) -> BoxedSendRequestFuture + Send + Sync>;

/// A wrapper around a model provider that provides a type-erased
/// interface for the other modules.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
}

impl ModelClient {
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `ModelClient` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn = Arc::new(
            move |req: ModelRequest| -> BoxedSendRequestFuture {
                let fut = provider.send_request(&req);
                Box::pin(
                    async move {
                        trace!("got a request: {:?}", req);
                        match fut.await {
                            Ok(resp) => Ok(resp),
                            Err(err) => {
                                error!("got an error: {err:?}");
                                Err(Box::new(err) as Box<dyn ModelProviderError>)
                            }
                        }
                    }
                    .instrument(trace_span!("model client req")),
                )
            },
        );
        Self { handler_fn }
    }

    /// Sends a request and returns the future of its response.
    ///
    /// The returned future doesn't borrow the client, so it can sit in a
    /// slot while the caller keeps handling other events.
    #[inline]
    pub fn send_request(&self, req: ModelRequest) -> BoxedSendRequestFuture {
        (self.handler_fn)(req)
    }
}

/// The text to render for a settled request, and the failure it stands
/// for, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Reply {
    pub text: String,
    pub failure: Option<ErrorKind>,
}

impl Reply {
    /// Folds any outcome of a request into displayable text. This never
    /// fails: errors become human-readable text so that the pending turn
    /// always gets resolved.
    pub fn from_result(result: SendRequestResult) -> Self {
        let err = match result {
            Ok(resp) => {
                if resp.finish_reason == Some(ModelFinishReason::Length) {
                    debug!("reply was cut off by the length limit");
                }
                let text = resp.content.trim();
                if !text.is_empty() {
                    return Self {
                        text: text.to_owned(),
                        failure: None,
                    };
                }
                warn!("got an empty completion");
                return Self {
                    text: FAILURE_SENTINEL.to_owned(),
                    failure: Some(ErrorKind::MalformedResponse),
                };
            }
            Err(err) => err,
        };

        let text = match (err.kind(), err.remote_message()) {
            (ErrorKind::Api, Some(message)) => {
                format!("⚠️ API error: {message}")
            }
            _ => FAILURE_SENTINEL.to_owned(),
        };
        Self {
            text,
            failure: Some(err.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use chatbox_test_model::{PresetReply, TestModelProvider};

    use super::*;

    async fn reply_for(preset: PresetReply) -> Reply {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_reply(preset);
        let model_client = ModelClient::new(model_provider);
        let result = model_client
            .send_request(ModelRequest::with_user_prompt("Hi"))
            .await;
        Reply::from_result(result)
    }

    #[tokio::test]
    async fn test_send_request() {
        let mut model_provider = TestModelProvider::default();
        model_provider.add_reply(PresetReply::text("\n  How are you?  "));
        let observer = model_provider.clone();
        let model_client = ModelClient::new(model_provider);

        let resp = model_client
            .send_request(ModelRequest::with_user_prompt("Hi"))
            .await
            .unwrap();
        assert_eq!(resp.content, "\n  How are you?  ");
        assert_eq!(observer.received_prompts(), ["Hi"]);
    }

    #[tokio::test]
    async fn test_successful_reply_is_trimmed() {
        let reply = reply_for(PresetReply::text("  Hello!\n")).await;
        assert_eq!(
            reply,
            Reply {
                text: "Hello!".to_owned(),
                failure: None
            }
        );
    }

    #[tokio::test]
    async fn test_failure_replies() {
        let reply = reply_for(PresetReply::failure(ErrorKind::Network)).await;
        assert_eq!(reply.text, FAILURE_SENTINEL);
        assert_eq!(reply.failure, Some(ErrorKind::Network));

        let reply =
            reply_for(PresetReply::failure(ErrorKind::MalformedResponse)).await;
        assert_eq!(reply.text, FAILURE_SENTINEL);

        let reply = reply_for(PresetReply::api_failure("Rate limit reached"))
            .await;
        assert_eq!(reply.text, "⚠️ API error: Rate limit reached");
        assert_eq!(reply.failure, Some(ErrorKind::Api));

        let reply = reply_for(PresetReply::failure(ErrorKind::Api)).await;
        assert_eq!(reply.text, FAILURE_SENTINEL);

        let reply = reply_for(PresetReply::text("   ")).await;
        assert_eq!(reply.text, FAILURE_SENTINEL);
        assert_eq!(reply.failure, Some(ErrorKind::MalformedResponse));
    }
}
