//! # Parley
//!
//! Parley runs turn-based conversations between several language-model agents, each playing
//! a persona, and can hand the finished transcript to a separate judge model that declares
//! a winner.
//!
//! The crate provides:
//!
//! * **Agents and personas**: an [`Agent`] binds a display name to a model and a persona
//!   from a [`PersonaRegistry`]. Ten personas ship built in; custom registries are plain
//!   builders.
//! * **Orchestration**: [`ConversationOrchestrator`] seeds opening statements and then drives
//!   every agent, in order, through a fixed number of turns. Each agent sees the whole
//!   multi-party history rebuilt from its own point of view.
//! * **Judging**: [`JudgeEvaluator`] summarises the conversation for a judge model and parses
//!   the free-text answer into a [`Verdict`].
//! * **Endpoints**: the [`ModelEndpoint`] trait is the only boundary to inference, with
//!   [`clients::ollama::OllamaClient`] and [`clients::openai::OpenAICompatibleClient`]
//!   implementations.
//! * **Export**: [`export`] renders Markdown or structured JSON.
//! * **Events**: an [`event::EventHandler`] observes turns, failures and the verdict.
//!
//! ## A full run
//!
//! ```rust,no_run
//! use parley::clients::ollama::OllamaClient;
//! use parley::config::EndpointConfig;
//! use parley::{export, Agent, ConversationOrchestrator, JudgeEvaluator};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     parley::init_logger();
//!     let endpoint = Arc::new(OllamaClient::new(EndpointConfig::default())?);
//!
//!     let mut conversation = ConversationOrchestrator::new(endpoint.clone(), 3);
//!     conversation.add_agent(Agent::new("Bot 1", "llama3.2", "Optimist"))?;
//!     conversation.add_agent(Agent::new("Bot 2", "mistral", "Skeptic"))?;
//!     conversation.add_agent(Agent::new("Bot 3", "phi3", "Comedian"))?;
//!
//!     conversation.initialize("Why did the chicken cross the road?").await?;
//!     conversation.run_to_completion().await?;
//!
//!     let judge = JudgeEvaluator::new(endpoint);
//!     let verdict = conversation.judge(&judge, "llama3.2").await?;
//!     match conversation.resolve_winner(&verdict) {
//!         Some(index) => println!("winner: {}", conversation.agents()[index].name),
//!         None => println!("winner: {}", verdict.winner_raw()),
//!     }
//!
//!     let markdown = export::to_markdown(
//!         conversation.state(),
//!         conversation.transcript(),
//!         Some(&verdict),
//!     );
//!     println!("{}", markdown);
//!     Ok(())
//! }
//! ```
//!
//! ## Testing without a server
//!
//! Any type implementing [`ModelEndpoint`] can stand in for a real server, which is how the
//! integration tests under `tests/` drive the orchestrator.
//!
//! ```rust
//! use async_trait::async_trait;
//! use parley::{Agent, ConversationOrchestrator, EndpointError, Message, ModelEndpoint};
//! use std::sync::Arc;
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl ModelEndpoint for Echo {
//!     async fn generate(
//!         &self,
//!         model: &str,
//!         messages: &[Message],
//!         _system_prompt: &str,
//!     ) -> Result<String, EndpointError> {
//!         Ok(format!("{} saw {} message(s)", model, messages.len()))
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), parley::ConversationError> {
//! let mut conversation = ConversationOrchestrator::new(Arc::new(Echo), 1);
//! conversation.add_agent(Agent::new("Ann", "m1", "Poet"))?;
//! conversation.add_agent(Agent::new("Bob", "m2", "Historian"))?;
//! conversation.initialize("Tea or coffee?").await?;
//!
//! let entries = conversation.advance_turn().await?;
//! assert_eq!(entries[0].message, "m1 saw 2 message(s)");
//! assert!(conversation.is_complete());
//! # Ok(())
//! # }
//! ```

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once.
///
/// Applications embedding Parley can opt in to `RUST_LOG` driven diagnostics without
/// choosing a logging backend upfront.
///
/// ```rust
/// parley::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::init();
    });
}

// Import the top-level `parley` module.
pub mod parley;

// Re-exporting key items for easier external access.
pub use parley::agent;
pub use parley::agent::Agent;
pub use parley::clients;
pub use parley::config;
pub use parley::config::{AgentConfig, ConversationConfig, EndpointConfig};
pub use parley::endpoint;
pub use parley::endpoint::{EndpointError, Message, ModelEndpoint, Role};
pub use parley::event;
pub use parley::event::{ConversationEvent, EventHandler};
pub use parley::export;
pub use parley::judge;
pub use parley::judge::{JudgeEvaluator, Verdict, VerdictOutcome};
pub use parley::orchestration;
pub use parley::orchestration::{
    ConversationError, ConversationOrchestrator, ConversationState, ConversationStats,
    TranscriptEntry,
};
pub use parley::persona;
pub use parley::persona::{Persona, PersonaRegistry};
