//! A model provider for OpenAI-compatible chat-completion APIs.

#[macro_use]
extern crate tracing;

mod config;
mod proto;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use chatbox_model::{
    ErrorKind, ModelProvider, ModelProviderError, ModelRequest, ModelResponse,
};
use mime::Mime;
use reqwest::{Client, StatusCode, header};

pub use config::{OpenAIConfig, OpenAIConfigBuilder};

/// Error type for [`OpenAIProvider`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
    status: Option<StatusCode>,
    remote_message: Option<String>,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
            status: None,
            remote_message: None,
        }
    }

    fn api(status: StatusCode, body: &str) -> Self {
        // The status text only stands in for a JSON error object that
        // carries no message. Any other body yields no remote message.
        let remote_message =
            proto::parse_error_response(body).and_then(|resp| {
                resp.into_message().or_else(|| {
                    status.canonical_reason().map(ToOwned::to_owned)
                })
            });
        Self {
            message: format!("server responded with status {status}"),
            kind: ErrorKind::Api,
            status: Some(status),
            remote_message,
        }
    }

    fn unexpected_content_type(content_type: Option<&str>) -> Self {
        Self::new(
            format!("unexpected content type: {content_type:?}"),
            ErrorKind::MalformedResponse,
        )
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the HTTP status, if the server answered at all.
    #[inline]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(remote_message) = &self.remote_message {
            write!(f, ": {remote_message}")?;
        }
        Ok(())
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

/// OpenAI-compatible model provider.
#[derive(Clone, Debug)]
pub struct OpenAIProvider {
    client: Client,
    config: Arc<OpenAIConfig>,
}

impl OpenAIProvider {
    /// Creates a new `OpenAIProvider` with the given configuration.
    #[inline]
    pub fn new(config: OpenAIConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

impl ModelProvider for OpenAIProvider {
    type Error = Error;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelResponse, Self::Error>> + Send + 'static
    {
        let openai_req = proto::create_request(req, &self.config);
        let resp_fut = self
            .client
            .post(self.config.completions_url())
            .header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.config.api_key),
            )
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .json(&openai_req)
            .send();

        async move {
            let resp = match resp_fut.await {
                Ok(resp) => resp,
                Err(err) => {
                    warn!("request failed: {err}");
                    return Err(Error::new(format!("{err}"), ErrorKind::Network));
                }
            };

            let status = resp.status();
            let content_type = resp
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(ToOwned::to_owned);
            let body = resp
                .text()
                .await
                .map_err(|err| Error::new(format!("{err}"), ErrorKind::Network))?;
            trace!("got response ({status}): {body}");

            if !status.is_success() {
                let err = Error::api(status, &body);
                warn!("API error: {err}");
                return Err(err);
            }

            if !is_json_content_type(content_type.as_deref()) {
                return Err(Error::unexpected_content_type(
                    content_type.as_deref(),
                ));
            }

            // Here we got a successful response.
            proto::parse_completion(&body)
        }
    }
}

/// A missing content type is tolerated, some compatible servers omit it.
fn is_json_content_type(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else {
        return true;
    };
    content_type
        .parse::<Mime>()
        .map(|m| m.subtype() == mime::JSON || m.suffix() == Some(mime::JSON))
        .unwrap_or(false)
}
