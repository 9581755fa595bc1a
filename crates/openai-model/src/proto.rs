use chatbox_model::{
    ErrorKind, ModelFinishReason, ModelMessage, ModelRequest, ModelResponse,
};
use serde::{Deserialize, Serialize};

use crate::{Error, OpenAIConfig};

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChatCompletion {
    pub choices: Vec<Choice>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
    pub finish_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ErrorResponse {
    pub error: Option<ErrorObject>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ErrorObject {
    pub message: Option<String>,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    User { content: String },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

// -----------
// Conversions
// -----------

#[inline]
pub fn create_request(
    req: &ModelRequest,
    config: &OpenAIConfig,
) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: config.model.clone(),
        messages: req.messages.iter().map(create_message).collect(),
        max_tokens: config.max_tokens,
        temperature: config.temperature,
    }
}

#[inline]
fn create_message(msg: &ModelMessage) -> Message {
    match msg {
        ModelMessage::User(content) => Message::User {
            content: content.clone(),
        },
    }
}

/// Extracts the first choice from a successful response body.
pub fn parse_completion(body: &str) -> Result<ModelResponse, Error> {
    let completion = serde_json::from_str::<ChatCompletion>(body)
        .map_err(|err| Error::new(format!("{err}"), ErrorKind::MalformedResponse))?;
    let Some(choice) = completion.choices.into_iter().next() else {
        return Err(Error::new(
            "response contains no choices",
            ErrorKind::MalformedResponse,
        ));
    };
    let Some(content) = choice.message.content else {
        return Err(Error::new(
            "first choice has no content",
            ErrorKind::MalformedResponse,
        ));
    };
    Ok(ModelResponse {
        content,
        finish_reason: choice
            .finish_reason
            .as_deref()
            .map(ModelFinishReason::from_raw),
    })
}

/// Parses an error body. Returns `None` if the body is not a JSON error
/// object, e.g. an HTML page from a proxy.
pub fn parse_error_response(body: &str) -> Option<ErrorResponse> {
    serde_json::from_str(body).ok()
}

impl ErrorResponse {
    /// Returns the human-readable message, if the server sent one.
    pub fn into_message(self) -> Option<String> {
        self.error?.message.filter(|m| !m.trim().is_empty())
    }
}
