use chatbox_model::{ErrorKind, ModelFinishReason};
use serde::{Deserialize, Serialize};

/// The preset reply for one request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PresetReply {
    /// The request succeeds with this completion text.
    #[serde(rename = "text")]
    Text {
        /// Raw completion text, returned untrimmed.
        content: String,
        /// Finish reason reported along with the text.
        finish_reason: Option<ModelFinishReason>,
    },
    /// The request fails.
    #[serde(rename = "failure")]
    Failure {
        /// Kind of the failure.
        kind: ErrorKind,
        /// Message reported by the "remote service", if any.
        remote_message: Option<String>,
    },
}

impl PresetReply {
    /// Creates a successful reply that stopped normally.
    #[inline]
    pub fn text<S: Into<String>>(content: S) -> Self {
        Self::Text {
            content: content.into(),
            finish_reason: Some(ModelFinishReason::Stop),
        }
    }

    /// Creates a failing reply without a remote message.
    #[inline]
    pub fn failure(kind: ErrorKind) -> Self {
        Self::Failure {
            kind,
            remote_message: None,
        }
    }

    /// Creates an API failure carrying the remote service's message.
    #[inline]
    pub fn api_failure<S: Into<String>>(remote_message: S) -> Self {
        Self::Failure {
            kind: ErrorKind::Api,
            remote_message: Some(remote_message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_deserialize() {
        let replies = vec![
            PresetReply::text("I have left a message for you."),
            PresetReply::api_failure("quota exceeded"),
            PresetReply::failure(ErrorKind::Network),
        ];

        let serialized = serde_json::to_string(&replies).unwrap();
        let deserialized: Vec<PresetReply> =
            serde_json::from_str(&serialized).unwrap();

        assert_eq!(replies, deserialized);
    }
}
