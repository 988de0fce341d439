//! Conversation event system.
//!
//! Implement [`EventHandler`] to observe a conversation while it runs: turn boundaries,
//! each agent's reply or failure, and the judge's verdict. The single method has a default
//! no-op body, so a handler only matches the events it cares about.
//!
//! Attach a handler with
//! [`ConversationOrchestrator::with_event_handler`](crate::orchestration::ConversationOrchestrator::with_event_handler).
//! The same handler can be given to a [`JudgeEvaluator`](crate::judge::JudgeEvaluator).
//!
//! # Example
//!
//! ```rust
//! use parley::event::{ConversationEvent, EventHandler};
//! use async_trait::async_trait;
//!
//! struct PrintHandler;
//!
//! #[async_trait]
//! impl EventHandler for PrintHandler {
//!     async fn on_conversation_event(&self, event: &ConversationEvent) {
//!         if let ConversationEvent::AgentResponded { agent_name, message, .. } = event {
//!             println!("{}: {}", agent_name, message);
//!         }
//!     }
//! }
//! ```

use async_trait::async_trait;

/// Events emitted by the orchestrator and the judge.
///
/// Every variant carries the `conversation_id` so one handler can follow several
/// conversations.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversationEvent {
    /// Opening statements were seeded.
    ConversationInitialized {
        conversation_id: String,
        topic: String,
        agent_count: usize,
        max_turns: usize,
    },

    TurnStarted {
        conversation_id: String,
        /// 1-based number of the turn being generated.
        turn: usize,
    },

    AgentResponded {
        conversation_id: String,
        turn: usize,
        agent_index: usize,
        agent_name: String,
        message: String,
    },

    /// The endpoint failed; the agent's slot holds `diagnostic` instead of a reply.
    AgentFailed {
        conversation_id: String,
        turn: usize,
        agent_index: usize,
        agent_name: String,
        error: String,
        diagnostic: String,
    },

    TurnCompleted {
        conversation_id: String,
        turn: usize,
        failures: usize,
    },

    JudgeStarted {
        conversation_id: String,
        judge_model: String,
    },

    VerdictReached {
        conversation_id: String,
        judge_model: String,
        /// Winner as extracted from the judge text, or the undetermined sentinel.
        winner: String,
        determined: bool,
    },
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn on_conversation_event(&self, _event: &ConversationEvent) {}
}
