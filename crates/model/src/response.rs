use serde::{Deserialize, Serialize};

/// A complete response from the model provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Text of the first completion choice, as sent by the service.
    pub content: String,
    /// The reason the model finished generating, if reported.
    pub finish_reason: Option<ModelFinishReason>,
}

/// The reason why a model response has finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelFinishReason {
    /// The model has finished generating text.
    Stop,
    /// The output was cut off by the length limit of the request.
    Length,
    /// Any other reason reported by the service.
    Other,
}

impl ModelFinishReason {
    /// Maps the raw `finish_reason` string used by chat-completion APIs.
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "stop" => Self::Stop,
            "length" => Self::Length,
            _ => Self::Other,
        }
    }
}
