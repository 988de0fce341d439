//! Turn-based conversation orchestration.
//!
//! A [`ConversationOrchestrator`] owns an ordered set of [`Agent`]s and drives them through
//! a fixed number of turns. In every turn each agent, in configured order, is shown the
//! whole multi-party history and asked for one reply.
//!
//! # Shared context
//!
//! Chat-completion APIs only know two speakers. To let a single request/response model take
//! part in an N-party conversation, the history is rebuilt for every agent from its own
//! point of view: the agent's own past messages are sent as `assistant` turns and everyone
//! else's as `user` turns, each prefixed with the speaker's name. See
//! [`build_shared_context`].
//!
//! # Lifecycle
//!
//! ```text
//! add_agent(..)*  ->  initialize(topic)  ->  advance_turn() x max_turns  ->  judge(..)
//!                     current_turn = 0       current_turn += 1
//!                     1 message per agent    +1 message per agent
//! ```
//!
//! Between turns every agent has exactly `current_turn + 1` messages. Operations that find
//! the logs out of step refuse to run.
//!
//! # Failures
//!
//! A failed model call never aborts the turn. The agent's slot is filled with a diagnostic
//! string (`"Error generating response: ..."`), the transcript entry is marked
//! [`failed`](TranscriptEntry::failed), and the remaining agents still speak.
//!
//! # Example
//!
//! ```rust,no_run
//! use parley::clients::ollama::OllamaClient;
//! use parley::config::EndpointConfig;
//! use parley::{Agent, ConversationOrchestrator};
//! use std::sync::Arc;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let endpoint = Arc::new(OllamaClient::new(EndpointConfig::default())?);
//!
//! let mut conversation = ConversationOrchestrator::new(endpoint, 3);
//! conversation.add_agent(Agent::new("Bot 1", "llama3.2", "Optimist"))?;
//! conversation.add_agent(Agent::new("Bot 2", "mistral", "Skeptic"))?;
//!
//! conversation.initialize("Is free will an illusion?").await?;
//! while !conversation.is_complete() {
//!     for entry in conversation.advance_turn().await? {
//!         println!("[turn {}] {}: {}", entry.turn_number, entry.agent_name, entry.message);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use crate::parley::agent::Agent;
use crate::parley::config::{ConfigError, ConversationConfig};
use crate::parley::endpoint::{Message, ModelEndpoint, Role};
use crate::parley::event::{ConversationEvent, EventHandler};
use crate::parley::judge::{resolve_winner, JudgeEvaluator, Verdict};
use crate::parley::persona::PersonaRegistry;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Opening line given to every agent after the first.
pub const ACKNOWLEDGEMENT: &str = "Great topic! I'm ready to discuss.";

/// Prefix of the text recorded in place of a reply when generation fails.
pub const GENERATION_ERROR_PREFIX: &str = "Error generating response:";

/// Opening line given to the first agent.
pub fn topic_introduction(topic: &str) -> String {
    format!("Today's topic for discussion is: '{}'. Let's begin!", topic)
}

/// Errors returned by orchestration and judging.
///
/// ```
/// use parley::ConversationError;
///
/// let err = ConversationError::Configuration("no agents configured".into());
/// assert_eq!(err.to_string(), "Configuration error: no agents configured");
/// ```
#[derive(Debug)]
pub enum ConversationError {
    /// The conversation is not in a state where the requested operation can run: no
    /// agents, an exhausted or invalid turn budget, or ragged message logs.
    Configuration(String),
    /// A [`ConversationConfig`] failed to load or validate.
    Config(ConfigError),
}

impl fmt::Display for ConversationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            ConversationError::Config(err) => write!(f, "{}", err),
        }
    }
}

impl Error for ConversationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConversationError::Configuration(_) => None,
            ConversationError::Config(err) => Some(err),
        }
    }
}

impl From<ConfigError> for ConversationError {
    fn from(err: ConfigError) -> Self {
        ConversationError::Config(err)
    }
}

/// One reply as it happened. Entries are appended to the transcript and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Position of the speaker in turn order.
    pub agent_index: usize,
    pub agent_name: String,
    pub persona: String,
    pub message: String,
    /// 1-based turn number; equal to the message's index in the agent's log.
    pub turn_number: usize,
    /// `true` when `message` is a generation diagnostic rather than model output.
    #[serde(default)]
    pub failed: bool,
}

/// Summary counters for a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationStats {
    /// Turns completed so far.
    pub total_turns: usize,
    pub max_turns: usize,
    /// Replies in the transcript; opening statements are not counted.
    pub total_messages: usize,
    pub failed_messages: usize,
    pub participants: usize,
}

/// Topic, participants and turn counter of one conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationState {
    /// Random identifier used in events and log lines.
    pub id: String,
    pub topic: String,
    agents: Vec<Agent>,
    current_turn: usize,
    max_turns: usize,
}

impl ConversationState {
    fn new(max_turns: usize) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            topic: String::new(),
            agents: Vec::new(),
            current_turn: 0,
            max_turns,
        }
    }

    /// Agents in turn order.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn current_turn(&self) -> usize {
        self.current_turn
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Whether opening statements have been seeded.
    pub fn is_initialized(&self) -> bool {
        !self.agents.is_empty() && self.agents.iter().all(|a| a.message_count() > 0)
    }

    /// Whether every agent holds exactly `current_turn + 1` messages.
    pub fn is_aligned(&self) -> bool {
        let expected = self.current_turn + 1;
        !self.agents.is_empty() && self.agents.iter().all(|a| a.message_count() == expected)
    }

    /// Whether the turn budget has been spent on an initialized conversation.
    pub fn is_complete(&self) -> bool {
        self.is_initialized() && self.current_turn >= self.max_turns
    }

    pub(crate) fn ensure_aligned(&self) -> Result<(), ConversationError> {
        if self.agents.is_empty() {
            return Err(ConversationError::Configuration(
                "no agents configured".into(),
            ));
        }
        if !self.is_initialized() {
            return Err(ConversationError::Configuration(
                "conversation has not been initialized".into(),
            ));
        }
        if !self.is_aligned() {
            let counts: Vec<usize> = self.agents.iter().map(Agent::message_count).collect();
            return Err(ConversationError::Configuration(format!(
                "ragged message logs at turn {}: expected {} message(s) per agent, found {:?}",
                self.current_turn,
                self.current_turn + 1,
                counts
            )));
        }
        Ok(())
    }
}

/// Build the history agent `current` sees, from its own point of view.
///
/// Only the first `m` messages of every log are used, where `m` is the shortest log length,
/// so a reply produced earlier in the same turn is not visible yet. For each turn index
/// `t < m` and each agent `j` in order one message is emitted: role `assistant` when
/// `j == current`, `user` otherwise, with content `"<name>: <message>"`.
///
/// ```
/// use parley::orchestration::build_shared_context;
/// use parley::Agent;
///
/// let agents = vec![Agent::new("Ann", "m", "Poet"), Agent::new("Bob", "m", "Poet")];
/// // No messages yet, so there is nothing to share.
/// assert!(build_shared_context(&agents, 0).is_empty());
/// ```
pub fn build_shared_context(agents: &[Agent], current: usize) -> Vec<Message> {
    let shared_turns = agents
        .iter()
        .map(Agent::message_count)
        .min()
        .unwrap_or(0);

    let mut context = Vec::with_capacity(shared_turns * agents.len());
    for turn in 0..shared_turns {
        for (index, agent) in agents.iter().enumerate() {
            let role = if index == current {
                Role::Assistant
            } else {
                Role::User
            };
            context.push(Message::new(
                role,
                format!("{}: {}", agent.name, agent.messages()[turn]),
            ));
        }
    }
    context
}

/// Drives one conversation from opening statements to the last turn.
pub struct ConversationOrchestrator {
    endpoint: Arc<dyn ModelEndpoint>,
    personas: Arc<PersonaRegistry>,
    state: ConversationState,
    transcript: Vec<TranscriptEntry>,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl ConversationOrchestrator {
    /// Create an empty conversation that will run for `max_turns` turns.
    ///
    /// Personas are resolved against [`PersonaRegistry::built_in`] unless
    /// [`with_personas`](Self::with_personas) says otherwise.
    pub fn new(endpoint: Arc<dyn ModelEndpoint>, max_turns: usize) -> Self {
        Self {
            endpoint,
            personas: PersonaRegistry::built_in(),
            state: ConversationState::new(max_turns),
            transcript: Vec::new(),
            event_handler: None,
        }
    }

    /// Validate `config` and create a conversation with its agents and turn budget.
    ///
    /// The topic is not applied; call [`initialize`](Self::initialize) with
    /// `config.topic` when the conversation should start.
    pub fn from_config(
        config: &ConversationConfig,
        endpoint: Arc<dyn ModelEndpoint>,
    ) -> Result<Self, ConversationError> {
        config.validate()?;
        let mut orchestrator = Self::new(endpoint, config.max_turns);
        for agent in &config.agents {
            orchestrator.add_agent(Agent::from(agent))?;
        }
        Ok(orchestrator)
    }

    /// Resolve personas against `registry` (builder pattern).
    pub fn with_personas(mut self, registry: Arc<PersonaRegistry>) -> Self {
        self.personas = registry;
        self
    }

    /// Attach an [`EventHandler`] (builder pattern).
    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    async fn emit(&self, event: ConversationEvent) {
        if let Some(handler) = &self.event_handler {
            handler.on_conversation_event(&event).await;
        }
    }

    /// Append a participant. Turn order is insertion order.
    ///
    /// Agents can only be added before [`initialize`](Self::initialize); adding one later
    /// would leave it a message behind everyone else.
    pub fn add_agent(&mut self, agent: Agent) -> Result<(), ConversationError> {
        if self.state.agents.iter().any(|a| a.message_count() > 0) {
            return Err(ConversationError::Configuration(format!(
                "cannot add agent '{}' to a conversation that has already started",
                agent.name
            )));
        }
        if !self.personas.contains(&agent.persona) {
            log::warn!(
                "parley::orchestration: agent '{}' uses unknown persona '{}', continuing without a system prompt",
                agent.name,
                agent.persona
            );
        }
        self.state.agents.push(agent);
        Ok(())
    }

    /// Seed the opening statements for `topic`.
    ///
    /// The first agent introduces the topic, every other agent acknowledges it, and the
    /// turn counter is set to zero. Any earlier messages and transcript are discarded, so
    /// this also serves as a full reset.
    pub async fn initialize(&mut self, topic: &str) -> Result<(), ConversationError> {
        if self.state.agents.is_empty() {
            return Err(ConversationError::Configuration(
                "at least one agent must be configured before initializing".into(),
            ));
        }
        if self.state.max_turns == 0 {
            return Err(ConversationError::Configuration(
                "max_turns must be greater than zero".into(),
            ));
        }

        self.transcript.clear();
        self.state.topic = topic.to_string();
        self.state.current_turn = 0;
        for (index, agent) in self.state.agents.iter_mut().enumerate() {
            agent.clear_messages();
            if index == 0 {
                agent.push_message(topic_introduction(topic));
            } else {
                agent.push_message(ACKNOWLEDGEMENT);
            }
        }

        log::info!(
            "parley::orchestration[{}]: initialized '{}' with {} agent(s), {} turn(s)",
            self.state.id,
            topic,
            self.state.agents.len(),
            self.state.max_turns
        );
        self.emit(ConversationEvent::ConversationInitialized {
            conversation_id: self.state.id.clone(),
            topic: topic.to_string(),
            agent_count: self.state.agents.len(),
            max_turns: self.state.max_turns,
        })
        .await;
        Ok(())
    }

    /// Generate one reply from every agent, in order.
    ///
    /// Returns the entries produced by this call: exactly one per agent, in agent order.
    /// Fails without touching any state when the turn budget is spent or the logs are out
    /// of step.
    pub async fn advance_turn(&mut self) -> Result<Vec<TranscriptEntry>, ConversationError> {
        self.state.ensure_aligned()?;
        if self.state.current_turn >= self.state.max_turns {
            return Err(ConversationError::Configuration(format!(
                "all {} turn(s) have already been generated",
                self.state.max_turns
            )));
        }

        let turn = self.state.current_turn + 1;
        log::info!(
            "parley::orchestration[{}]: generating turn {}/{}",
            self.state.id,
            turn,
            self.state.max_turns
        );
        self.emit(ConversationEvent::TurnStarted {
            conversation_id: self.state.id.clone(),
            turn,
        })
        .await;

        let mut produced = Vec::with_capacity(self.state.agents.len());
        for index in 0..self.state.agents.len() {
            let context = build_shared_context(&self.state.agents, index);
            let agent = &self.state.agents[index];
            let system_prompt = self.personas.system_prompt(&agent.persona);
            log::debug!(
                "parley::orchestration[{}]: {} ({}) sees {} message(s)",
                self.state.id,
                agent.name,
                agent.model,
                context.len()
            );

            let result = self
                .endpoint
                .generate(&agent.model, &context, system_prompt)
                .await;

            let (message, failed) = match result {
                Ok(text) => (text, false),
                Err(err) => {
                    let diagnostic = format!("{} {}", GENERATION_ERROR_PREFIX, err);
                    log::warn!(
                        "parley::orchestration[{}]: {} failed in turn {} via {}: {}",
                        self.state.id,
                        agent.name,
                        turn,
                        self.endpoint.name(),
                        err
                    );
                    self.emit(ConversationEvent::AgentFailed {
                        conversation_id: self.state.id.clone(),
                        turn,
                        agent_index: index,
                        agent_name: agent.name.clone(),
                        error: err.to_string(),
                        diagnostic: diagnostic.clone(),
                    })
                    .await;
                    (diagnostic, true)
                }
            };

            let agent = &mut self.state.agents[index];
            agent.push_message(message.clone());
            let entry = TranscriptEntry {
                agent_index: index,
                agent_name: agent.name.clone(),
                persona: agent.persona.clone(),
                message,
                turn_number: turn,
                failed,
            };

            if !failed {
                self.emit(ConversationEvent::AgentResponded {
                    conversation_id: self.state.id.clone(),
                    turn,
                    agent_index: index,
                    agent_name: entry.agent_name.clone(),
                    message: entry.message.clone(),
                })
                .await;
            }

            self.transcript.push(entry.clone());
            produced.push(entry);
        }

        self.state.current_turn = turn;
        let failures = produced.iter().filter(|e| e.failed).count();
        self.emit(ConversationEvent::TurnCompleted {
            conversation_id: self.state.id.clone(),
            turn,
            failures,
        })
        .await;

        Ok(produced)
    }

    /// Advance until the turn budget is spent, returning every entry produced.
    pub async fn run_to_completion(&mut self) -> Result<Vec<TranscriptEntry>, ConversationError> {
        let mut produced = Vec::new();
        while self.state.current_turn < self.state.max_turns {
            produced.extend(self.advance_turn().await?);
        }
        Ok(produced)
    }

    /// Ask `judge_model` to evaluate this conversation.
    pub async fn judge(
        &self,
        evaluator: &JudgeEvaluator,
        judge_model: &str,
    ) -> Result<Verdict, ConversationError> {
        evaluator.evaluate(&self.state, judge_model).await
    }

    /// Index of the agent a verdict names, if any.
    pub fn resolve_winner(&self, verdict: &Verdict) -> Option<usize> {
        verdict
            .winner()
            .and_then(|winner| resolve_winner(&self.state.agents, winner))
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn id(&self) -> &str {
        &self.state.id
    }

    pub fn topic(&self) -> &str {
        &self.state.topic
    }

    pub fn agents(&self) -> &[Agent] {
        self.state.agents()
    }

    /// Every entry produced since [`initialize`](Self::initialize), oldest first.
    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn personas(&self) -> &PersonaRegistry {
        &self.personas
    }

    pub fn current_turn(&self) -> usize {
        self.state.current_turn
    }

    pub fn max_turns(&self) -> usize {
        self.state.max_turns
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }

    pub fn stats(&self) -> ConversationStats {
        ConversationStats {
            total_turns: self.state.current_turn,
            max_turns: self.state.max_turns,
            total_messages: self.transcript.len(),
            failed_messages: self.transcript.iter().filter(|e| e.failed).count(),
            participants: self.state.agents.len(),
        }
    }

    /// Give up the orchestrator and keep its final state and transcript.
    pub fn into_parts(self) -> (ConversationState, Vec<TranscriptEntry>) {
        (self.state, self.transcript)
    }
}
