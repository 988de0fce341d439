//! A single persona-bound participant.
//!
//! An [`Agent`] is a plain data holder: a display name, the model identifier it is served
//! by, the name of the persona it plays, and its own ordered message log. Index `0` of the
//! log is the opening statement and index `t` is the reply produced in turn `t`.
//!
//! The log can only grow, and only the orchestrator that owns the agent appends to it.
//!
//! ```rust
//! use parley::Agent;
//!
//! let agent = Agent::new("Bot 1", "llama3.2", "Optimist");
//! assert_eq!(agent.message_count(), 0);
//! assert!(agent.opening_statement().is_none());
//! ```

use crate::config::AgentConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    /// Display identity; need not be unique.
    pub name: String,
    /// Model identifier passed through to the endpoint.
    pub model: String,
    /// Persona name, resolved against a registry at generation time.
    pub persona: String,
    messages: Vec<String>,
}

impl Agent {
    pub fn new(name: impl Into<String>, model: impl Into<String>, persona: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            persona: persona.into(),
            messages: Vec::new(),
        }
    }

    /// All messages produced so far, oldest first.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn message(&self, turn: usize) -> Option<&str> {
        self.messages.get(turn).map(String::as_str)
    }

    pub fn opening_statement(&self) -> Option<&str> {
        self.message(0)
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub(crate) fn push_message(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    pub(crate) fn clear_messages(&mut self) {
        self.messages.clear();
    }
}

impl From<&AgentConfig> for Agent {
    fn from(config: &AgentConfig) -> Self {
        Agent::new(&config.name, &config.model, &config.persona)
    }
}
