//! The single boundary between a conversation and model inference.
//!
//! A [`ModelEndpoint`] turns one `(model, messages, system_prompt)` request into generated
//! text. It is deliberately stateless with respect to the conversation: the orchestrator
//! rebuilds the whole shared context for every call, so an endpoint never has to remember
//! anything between requests.
//!
//! Concrete adapters live in [`crate::clients`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

/// Represents the possible roles for a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    // text authored by another participant, from the receiving agent's point of view
    User,
    // text the receiving agent produced itself
    Assistant,
}

impl Role {
    /// Wire name used by chat-completion style APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Capitalised label used when a conversation is flattened into a single prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Role::System => "System",
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents a generic message to be sent to an LLM.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The role associated with the message.
    pub role: Role,
    /// The actual content of the message.
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Ways a single inference call can fail.
///
/// The orchestrator treats every variant the same way (the agent's turn is filled with a
/// diagnostic string), but the variants are kept distinct so logs say what actually went
/// wrong.
///
/// ```
/// use parley::EndpointError;
///
/// let err = EndpointError::Status { code: 404, body: "model not found".into() };
/// assert_eq!(err.to_string(), "endpoint returned HTTP 404: model not found");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointError {
    /// The server could not be reached at all.
    Connection(String),
    /// The per-call time budget elapsed before a response arrived.
    Timeout(String),
    /// The server answered with a non-2xx status.
    Status { code: u16, body: String },
    /// The body could not be decoded into the expected shape.
    MalformedResponse(String),
    /// Any other transport level failure.
    Request(String),
}

impl fmt::Display for EndpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointError::Connection(msg) => write!(f, "could not connect to endpoint: {}", msg),
            EndpointError::Timeout(msg) => write!(f, "request timed out: {}", msg),
            EndpointError::Status { code, body } if body.is_empty() => {
                write!(f, "endpoint returned HTTP {}", code)
            }
            EndpointError::Status { code, body } => {
                write!(f, "endpoint returned HTTP {}: {}", code, body)
            }
            EndpointError::MalformedResponse(msg) => write!(f, "malformed response: {}", msg),
            EndpointError::Request(msg) => write!(f, "request failed: {}", msg),
        }
    }
}

impl Error for EndpointError {}

/// Trait defining the interface to a chat-capable model server.
///
/// Implementations must fail cleanly on an unreachable endpoint, a non-2xx response, or a
/// malformed body. They must not retry; the caller decides what a failure means.
#[async_trait]
pub trait ModelEndpoint: Send + Sync {
    /// Generate one reply from `model` given the ordered `messages` and a `system_prompt`.
    ///
    /// An empty `system_prompt` means "no persona" and should not be sent as an empty
    /// system message.
    async fn generate(
        &self,
        model: &str,
        messages: &[Message],
        system_prompt: &str,
    ) -> Result<String, EndpointError>;

    /// Short name used in log lines.
    fn name(&self) -> &str {
        "endpoint"
    }
}
