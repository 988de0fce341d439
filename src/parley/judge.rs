//! Judging a finished conversation.
//!
//! The [`JudgeEvaluator`] flattens the whole conversation into one summary prompt, sends it
//! to a judge model together with a fixed rubric, and turns the free-text answer into a
//! [`Verdict`].
//!
//! Judge output is untrusted text. Parsing is a tolerant line scan for a `WINNER:` line;
//! when none is found the outcome is [`VerdictOutcome::Undetermined`] and the raw text is
//! still kept verbatim in [`Verdict::full_text`].
//!
//! ```rust
//! use parley::judge::{parse_verdict, VerdictOutcome};
//!
//! let outcome = parse_verdict("WINNER: Bot 2\nREASONING: Sharper arguments.");
//! assert_eq!(outcome, VerdictOutcome::Parsed("Bot 2".into()));
//!
//! assert_eq!(parse_verdict("I liked them all."), VerdictOutcome::Undetermined);
//! ```

use crate::parley::agent::Agent;
use crate::parley::endpoint::{Message, ModelEndpoint, Role};
use crate::parley::event::{ConversationEvent, EventHandler};
use crate::parley::orchestration::{ConversationError, ConversationState, GENERATION_ERROR_PREFIX};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Token that opens the winner line of a verdict.
pub const WINNER_TOKEN: &str = "WINNER:";

/// Winner string recorded when the judge text names nobody.
pub const UNDETERMINED_WINNER: &str = "undetermined";

/// Rubric and required answer shape sent as the judge's system prompt.
pub const JUDGE_SYSTEM_PROMPT: &str = "You are an expert debate judge and conversation analyst.
You evaluate conversations based on:
1. Coherence and relevance to the topic
2. Depth of insights and arguments
3. Creativity and originality
4. Engagement and persuasiveness
5. Consistency with their assigned persona

Analyze the conversation and declare a winner. Provide your verdict in exactly this format:

WINNER: [Name of the winning chatbot]
REASONING: [2-3 sentences explaining why this chatbot won]
HIGHLIGHTS: [Mention one strong point from each participant]

Be fair, objective, and provide constructive feedback.";

const JUDGE_REQUEST: &str = "Please analyze this conversation and declare a winner.";

/// What the line scan found in the judge text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "winner", rename_all = "snake_case")]
pub enum VerdictOutcome {
    Parsed(String),
    Undetermined,
}

/// Scan `text` for the first line starting with `WINNER:`.
///
/// Leading whitespace on the line is ignored. The winner is the rest of that line, trimmed;
/// an empty remainder counts as undetermined.
pub fn parse_verdict(text: &str) -> VerdictOutcome {
    text.lines()
        .find_map(|line| line.trim_start().strip_prefix(WINNER_TOKEN))
        .map(str::trim)
        .filter(|winner| !winner.is_empty())
        .map(|winner| VerdictOutcome::Parsed(winner.to_string()))
        .unwrap_or(VerdictOutcome::Undetermined)
}

/// The judge's evaluation of one conversation. Created once, never changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub judge_model: String,
    pub outcome: VerdictOutcome,
    /// The judge's answer exactly as received.
    pub full_text: String,
    pub timestamp: DateTime<Utc>,
}

impl Verdict {
    /// Parse `full_text` and stamp the verdict with the current time.
    pub fn new(judge_model: impl Into<String>, full_text: impl Into<String>) -> Self {
        let full_text = full_text.into();
        Self {
            judge_model: judge_model.into(),
            outcome: parse_verdict(&full_text),
            full_text,
            timestamp: Utc::now(),
        }
    }

    /// Rebuild a verdict from stored fields, e.g. an exported document.
    pub fn from_parts(
        judge_model: impl Into<String>,
        outcome: VerdictOutcome,
        full_text: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            judge_model: judge_model.into(),
            outcome,
            full_text: full_text.into(),
            timestamp,
        }
    }

    /// The extracted winner, if the judge named one.
    pub fn winner(&self) -> Option<&str> {
        match &self.outcome {
            VerdictOutcome::Parsed(winner) => Some(winner.as_str()),
            VerdictOutcome::Undetermined => None,
        }
    }

    /// The extracted winner, or [`UNDETERMINED_WINNER`].
    pub fn winner_raw(&self) -> &str {
        self.winner().unwrap_or(UNDETERMINED_WINNER)
    }

    pub fn is_determined(&self) -> bool {
        self.winner().is_some()
    }
}

/// Find the agent a winner string refers to.
///
/// An agent matches when its name is a case-insensitive substring of `winner` or the other
/// way round. The first match in agent order wins. Agents with blank names never match.
///
/// ```
/// use parley::judge::resolve_winner;
/// use parley::Agent;
///
/// let agents: Vec<Agent> = ["Bot 1", "Bot 2", "Bot 3"]
///     .iter()
///     .map(|name| Agent::new(*name, "m", "Poet"))
///     .collect();
///
/// assert_eq!(resolve_winner(&agents, "bot 2"), Some(1));
/// assert_eq!(resolve_winner(&agents, "The Philosopher"), None);
/// ```
pub fn resolve_winner(agents: &[Agent], winner: &str) -> Option<usize> {
    let winner = winner.trim().to_lowercase();
    if winner.is_empty() {
        return None;
    }
    agents.iter().position(|agent| {
        let name = agent.name.trim().to_lowercase();
        !name.is_empty() && (winner.contains(&name) || name.contains(&winner))
    })
}

/// Render the conversation as the judge reads it.
///
/// Topic, numbered participants with their personas, the opening statements, then one
/// `Turn k:` block per completed turn with every agent's reply labelled by name.
pub fn build_judge_prompt(state: &ConversationState) -> String {
    let mut summary = format!("Topic: {}\n\n", state.topic);

    summary.push_str("Participants:\n");
    for (index, agent) in state.agents().iter().enumerate() {
        summary.push_str(&format!("{}. {} - {} persona\n", index + 1, agent.name, agent.persona));
    }

    summary.push_str("\n\nConversation:\n\n");
    summary.push_str("Opening Statements:\n");
    for agent in state.agents() {
        if let Some(opening) = agent.opening_statement() {
            summary.push_str(&format!("{}: {}\n", agent.name, opening));
        }
    }
    summary.push('\n');

    for turn in 1..=state.current_turn() {
        summary.push_str(&format!("\nTurn {}:\n", turn));
        for agent in state.agents() {
            if let Some(message) = agent.message(turn) {
                summary.push_str(&format!("{}: {}\n", agent.name, message));
            }
        }
    }

    summary
}

/// Sends a finished conversation to a judge model and parses the answer.
pub struct JudgeEvaluator {
    endpoint: Arc<dyn ModelEndpoint>,
    system_prompt: String,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl JudgeEvaluator {
    pub fn new(endpoint: Arc<dyn ModelEndpoint>) -> Self {
        Self {
            endpoint,
            system_prompt: JUDGE_SYSTEM_PROMPT.to_string(),
            event_handler: None,
        }
    }

    /// Replace the rubric (builder pattern). The parser still looks for `WINNER:`.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
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

    /// Evaluate a completed conversation with `judge_model`.
    ///
    /// Fails with [`ConversationError::Configuration`] unless every turn has been
    /// generated and the message logs are aligned. A failed judge call is not an error:
    /// the verdict then carries the diagnostic text and an undetermined outcome.
    pub async fn evaluate(
        &self,
        state: &ConversationState,
        judge_model: &str,
    ) -> Result<Verdict, ConversationError> {
        state.ensure_aligned()?;
        if state.current_turn() < state.max_turns() {
            return Err(ConversationError::Configuration(format!(
                "conversation is not finished: {} of {} turn(s) generated",
                state.current_turn(),
                state.max_turns()
            )));
        }

        self.emit(ConversationEvent::JudgeStarted {
            conversation_id: state.id.clone(),
            judge_model: judge_model.to_string(),
        })
        .await;

        let summary = build_judge_prompt(state);
        let request = vec![Message::new(
            Role::User,
            format!("{}\n\n{}", summary, JUDGE_REQUEST),
        )];

        log::info!(
            "parley::judge[{}]: asking {} for a verdict",
            state.id,
            judge_model
        );
        let full_text = match self
            .endpoint
            .generate(judge_model, &request, &self.system_prompt)
            .await
        {
            Ok(text) => text,
            Err(err) => {
                log::error!(
                    "parley::judge[{}]: judge {} failed via {}: {}",
                    state.id,
                    judge_model,
                    self.endpoint.name(),
                    err
                );
                format!("{} {}", GENERATION_ERROR_PREFIX, err)
            }
        };

        let verdict = Verdict::new(judge_model, full_text);
        if !verdict.is_determined() {
            log::warn!(
                "parley::judge[{}]: no {} line in the judge's answer",
                state.id,
                WINNER_TOKEN
            );
        }

        self.emit(ConversationEvent::VerdictReached {
            conversation_id: state.id.clone(),
            judge_model: judge_model.to_string(),
            winner: verdict.winner_raw().to_string(),
            determined: verdict.is_determined(),
        })
        .await;

        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_winner_line_wins() {
        let text = "Thoughts first.\nWINNER: Bot 3\nWINNER: Bot 1";
        assert_eq!(parse_verdict(text), VerdictOutcome::Parsed("Bot 3".into()));
    }

    #[test]
    fn indented_winner_line_is_accepted() {
        let text = "   WINNER:   Bot 1  \r\nREASONING: x";
        assert_eq!(parse_verdict(text), VerdictOutcome::Parsed("Bot 1".into()));
    }

    #[test]
    fn token_inside_a_line_is_ignored() {
        let text = "The WINNER: is unclear";
        assert_eq!(parse_verdict(text), VerdictOutcome::Undetermined);
    }

    #[test]
    fn empty_winner_is_undetermined() {
        assert_eq!(parse_verdict("WINNER:\nREASONING: none"), VerdictOutcome::Undetermined);
    }

    #[test]
    fn lowercase_token_is_not_a_winner_line() {
        assert_eq!(parse_verdict("winner: Bot 1"), VerdictOutcome::Undetermined);
    }

    #[test]
    fn undetermined_verdict_uses_sentinel() {
        let verdict = Verdict::new("judge", "no idea");
        assert_eq!(verdict.winner_raw(), UNDETERMINED_WINNER);
        assert_eq!(verdict.full_text, "no idea");
    }

    #[test]
    fn judge_naming_the_sentinel_is_still_determined() {
        let verdict = Verdict::new("judge", "WINNER: undetermined\nREASONING: a tie.");
        assert_eq!(verdict.outcome, VerdictOutcome::Parsed(UNDETERMINED_WINNER.into()));
        assert!(verdict.is_determined());

        let restored = Verdict::from_parts(
            &verdict.judge_model,
            verdict.outcome.clone(),
            &verdict.full_text,
            verdict.timestamp,
        );
        assert_eq!(restored, verdict);
    }

    #[test]
    fn resolution_works_in_both_directions() {
        let agents = vec![Agent::new("The Skeptic Bot", "m", "Skeptic")];
        assert_eq!(resolve_winner(&agents, "skeptic"), Some(0));
        assert_eq!(resolve_winner(&agents, "**the skeptic bot**"), Some(0));
    }

    #[test]
    fn blank_names_never_match() {
        let agents = vec![Agent::new("", "m", "Poet"), Agent::new("Bot 2", "m", "Poet")];
        assert_eq!(resolve_winner(&agents, "Bot 2 wins"), Some(1));
        assert_eq!(resolve_winner(&agents, "   "), None);
    }
}
