//! Transcript export.
//!
//! Two formats are produced from the same inputs (the final [`ConversationState`], its
//! transcript and an optional [`Verdict`]):
//!
//! * [`to_markdown`], a human readable document with the topic, participants, opening
//!   statements, every turn, and the judge's verdict.
//! * [`to_json`], a structured [`ExportDocument`] that [`ExportDocument::from_json`] can
//!   read back.
//!
//! Turns are grouped by each transcript entry's own `turn_number`.

use crate::parley::judge::{Verdict, VerdictOutcome};
use crate::parley::orchestration::{ConversationState, TranscriptEntry};
use crate::parley::persona::PersonaRegistry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub topic: String,
    pub timestamp: DateTime<Utc>,
    pub total_turns: usize,
    pub total_messages: usize,
    pub number_of_participants: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportParticipant {
    /// 1-based position in turn order.
    pub id: usize,
    pub name: String,
    pub model: String,
    pub persona: String,
    pub persona_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOpening {
    pub participant_id: usize,
    pub participant_name: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportResponse {
    pub participant_id: usize,
    pub participant_name: String,
    pub persona: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportTurn {
    pub turn_number: usize,
    pub responses: Vec<ExportResponse>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConversation {
    pub opening_statements: Vec<ExportOpening>,
    pub turns: Vec<ExportTurn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportVerdict {
    pub judge_model: String,
    /// Extracted winner, or `"undetermined"`.
    pub winner: String,
    /// Parse result. `winner` alone is ambiguous when the judge named `"undetermined"`.
    pub outcome: VerdictOutcome,
    pub full_verdict: String,
    pub timestamp: DateTime<Utc>,
}

/// The structured JSON export of one conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub metadata: ExportMetadata,
    pub participants: Vec<ExportParticipant>,
    pub conversation: ExportConversation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judge_verdict: Option<ExportVerdict>,
}

/// Group transcript entries by turn number, keeping their order within a turn.
fn group_by_turn(transcript: &[TranscriptEntry]) -> BTreeMap<usize, Vec<&TranscriptEntry>> {
    let mut turns: BTreeMap<usize, Vec<&TranscriptEntry>> = BTreeMap::new();
    for entry in transcript {
        turns.entry(entry.turn_number).or_default().push(entry);
    }
    turns
}

impl ExportDocument {
    /// Assemble the document. Persona descriptions are looked up in `personas`.
    pub fn build(
        state: &ConversationState,
        transcript: &[TranscriptEntry],
        verdict: Option<&Verdict>,
        personas: &PersonaRegistry,
    ) -> Self {
        let agents = state.agents();

        let participants = agents
            .iter()
            .enumerate()
            .map(|(index, agent)| ExportParticipant {
                id: index + 1,
                name: agent.name.clone(),
                model: agent.model.clone(),
                persona: agent.persona.clone(),
                persona_description: personas.description(&agent.persona).to_string(),
            })
            .collect();

        let opening_statements = agents
            .iter()
            .enumerate()
            .map(|(index, agent)| ExportOpening {
                participant_id: index + 1,
                participant_name: agent.name.clone(),
                message: agent.opening_statement().unwrap_or_default().to_string(),
            })
            .collect();

        let turns = group_by_turn(transcript)
            .into_iter()
            .map(|(turn_number, entries)| ExportTurn {
                turn_number,
                responses: entries
                    .into_iter()
                    .map(|entry| ExportResponse {
                        participant_id: entry.agent_index + 1,
                        participant_name: entry.agent_name.clone(),
                        persona: entry.persona.clone(),
                        message: entry.message.clone(),
                    })
                    .collect(),
            })
            .collect();

        let judge_verdict = verdict.map(|verdict| ExportVerdict {
            judge_model: verdict.judge_model.clone(),
            winner: verdict.winner_raw().to_string(),
            outcome: verdict.outcome.clone(),
            full_verdict: verdict.full_text.clone(),
            timestamp: verdict.timestamp,
        });

        Self {
            metadata: ExportMetadata {
                topic: state.topic.clone(),
                timestamp: Utc::now(),
                total_turns: state.current_turn(),
                total_messages: transcript.len(),
                number_of_participants: agents.len(),
            },
            participants,
            conversation: ExportConversation {
                opening_statements,
                turns,
            },
            judge_verdict,
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Rebuild the [`Verdict`] carried by the document, if any.
    pub fn verdict(&self) -> Option<Verdict> {
        self.judge_verdict.as_ref().map(|v| {
            Verdict::from_parts(&v.judge_model, v.outcome.clone(), &v.full_verdict, v.timestamp)
        })
    }
}

/// Serialize a conversation into the structured JSON document.
pub fn to_json(
    state: &ConversationState,
    transcript: &[TranscriptEntry],
    verdict: Option<&Verdict>,
    personas: &PersonaRegistry,
) -> Result<String, serde_json::Error> {
    ExportDocument::build(state, transcript, verdict, personas).to_json()
}

/// Render a conversation as Markdown.
pub fn to_markdown(
    state: &ConversationState,
    transcript: &[TranscriptEntry],
    verdict: Option<&Verdict>,
) -> String {
    let mut out = String::from("# Multi-Model Chatbot Conversation\n\n");
    out.push_str(&format!("**Topic:** {}\n\n", state.topic));

    out.push_str("**Participants:**\n");
    for agent in state.agents() {
        out.push_str(&format!("- {} ({}) - {}\n", agent.name, agent.model, agent.persona));
    }
    out.push_str("\n---\n\n");

    out.push_str("## Opening Statements\n\n");
    for agent in state.agents() {
        if let Some(opening) = agent.opening_statement() {
            out.push_str(&format!("**{}:** {}\n\n", agent.name, opening));
        }
    }

    out.push_str("## Conversation\n\n");
    for (turn_number, entries) in group_by_turn(transcript) {
        out.push_str(&format!("### Turn {}\n\n", turn_number));
        for entry in entries {
            out.push_str(&format!("**{}:** {}\n\n", entry.agent_name, entry.message));
        }
    }

    if let Some(verdict) = verdict {
        out.push_str("---\n\n## Judge's Verdict\n\n");
        out.push_str(&format!("**Judge Model:** {}\n\n", verdict.judge_model));
        out.push_str(&format!("**Winner:** {}\n\n", verdict.winner_raw()));
        out.push_str(&format!("**Verdict:**\n\n{}\n\n", verdict.full_text));
    }

    out
}
