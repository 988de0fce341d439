use async_trait::async_trait;
use parley::event::{ConversationEvent, EventHandler};
use parley::judge::{
    build_judge_prompt, parse_verdict, resolve_winner, JUDGE_SYSTEM_PROMPT, UNDETERMINED_WINNER,
};
use parley::orchestration::GENERATION_ERROR_PREFIX;
use parley::{
    Agent, ConversationError, ConversationOrchestrator, EndpointError, JudgeEvaluator, Message,
    ModelEndpoint, Role, VerdictOutcome,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Answers per model from a fixed table; unknown models fail.
struct ScriptedEndpoint {
    replies: HashMap<String, String>,
    requests: Mutex<Vec<(String, Vec<Message>, String)>>,
}

impl ScriptedEndpoint {
    fn new(replies: &[(&str, &str)]) -> Self {
        Self {
            replies: replies
                .iter()
                .map(|(model, reply)| (model.to_string(), reply.to_string()))
                .collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    async fn requests_for(&self, model: &str) -> Vec<(String, Vec<Message>, String)> {
        self.requests
            .lock()
            .await
            .iter()
            .filter(|(m, _, _)| m == model)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ModelEndpoint for ScriptedEndpoint {
    async fn generate(
        &self,
        model: &str,
        messages: &[Message],
        system_prompt: &str,
    ) -> Result<String, EndpointError> {
        self.requests.lock().await.push((
            model.to_string(),
            messages.to_vec(),
            system_prompt.to_string(),
        ));
        self.replies
            .get(model)
            .cloned()
            .ok_or_else(|| EndpointError::Status {
                code: 404,
                body: format!("model '{}' not found", model),
            })
    }
}

#[derive(Default)]
struct EventRecorder {
    events: Mutex<Vec<ConversationEvent>>,
}

#[async_trait]
impl EventHandler for EventRecorder {
    async fn on_conversation_event(&self, event: &ConversationEvent) {
        self.events.lock().await.push(event.clone());
    }
}

const VERDICT: &str = "WINNER: Bot 2\nREASONING: Consistently sharp.\nHIGHLIGHTS: Bot 1 was upbeat; Bot 2 was witty.";

async fn finished_conversation(
    endpoint: Arc<ScriptedEndpoint>,
    turns: usize,
) -> ConversationOrchestrator {
    let mut conversation = ConversationOrchestrator::new(endpoint, turns);
    conversation
        .add_agent(Agent::new("Bot 1", "ann", "Optimist"))
        .unwrap();
    conversation
        .add_agent(Agent::new("Bot 2", "bob", "Skeptic"))
        .unwrap();
    conversation.initialize("Is cereal a soup?").await.unwrap();
    conversation.run_to_completion().await.unwrap();
    conversation
}

#[test]
fn test_parse_winner_line() {
    assert_eq!(
        parse_verdict("WINNER: Bot 2\nREASONING: ..."),
        VerdictOutcome::Parsed("Bot 2".to_string())
    );
}

#[test]
fn test_parse_without_winner_line() {
    let text = "Both bots did well.\nREASONING: hard to say.";
    assert_eq!(parse_verdict(text), VerdictOutcome::Undetermined);
}

#[test]
fn test_winner_resolution() {
    let agents: Vec<Agent> = ["Bot 1", "Bot 2", "Bot 3"]
        .iter()
        .map(|name| Agent::new(*name, "m", "Poet"))
        .collect();

    assert_eq!(resolve_winner(&agents, "bot 2"), Some(1));
    assert_eq!(resolve_winner(&agents, "BOT 3 (the comedian)"), Some(2));
    assert_eq!(resolve_winner(&agents, "The Philosopher"), None);
}

#[test]
fn test_winner_resolution_prefers_earlier_agents() {
    let agents = vec![
        Agent::new("Bot", "m", "Poet"),
        Agent::new("Bot 2", "m", "Poet"),
    ];
    // "Bot" is a substring of "Bot 2" and comes first.
    assert_eq!(resolve_winner(&agents, "Bot 2"), Some(0));
}

#[tokio::test]
async fn test_judge_prompt_layout() {
    let endpoint = Arc::new(ScriptedEndpoint::new(&[("ann", "a1"), ("bob", "b1")]));
    let conversation = finished_conversation(endpoint, 1).await;

    let expected = "Topic: Is cereal a soup?\n\n\
        Participants:\n\
        1. Bot 1 - Optimist persona\n\
        2. Bot 2 - Skeptic persona\n\
        \n\nConversation:\n\n\
        Opening Statements:\n\
        Bot 1: Today's topic for discussion is: 'Is cereal a soup?'. Let's begin!\n\
        Bot 2: Great topic! I'm ready to discuss.\n\
        \n\
        \nTurn 1:\n\
        Bot 1: a1\n\
        Bot 2: b1\n";
    assert_eq!(build_judge_prompt(conversation.state()), expected);
}

#[tokio::test]
async fn test_judge_before_completion_fails() {
    let endpoint = Arc::new(ScriptedEndpoint::new(&[
        ("ann", "a"),
        ("bob", "b"),
        ("judge", VERDICT),
    ]));
    let mut conversation = ConversationOrchestrator::new(endpoint.clone(), 2);
    conversation
        .add_agent(Agent::new("Bot 1", "ann", "Optimist"))
        .unwrap();
    conversation.initialize("Early verdict").await.unwrap();
    conversation.advance_turn().await.unwrap();

    let evaluator = JudgeEvaluator::new(endpoint.clone());
    let err = conversation.judge(&evaluator, "judge").await.unwrap_err();
    assert!(matches!(err, ConversationError::Configuration(_)));
    assert!(endpoint.requests_for("judge").await.is_empty());
}

#[tokio::test]
async fn test_judge_declares_winner() {
    let endpoint = Arc::new(ScriptedEndpoint::new(&[
        ("ann", "Cereal is joy."),
        ("bob", "Soup needs a stove."),
        ("judge", VERDICT),
    ]));
    let conversation = finished_conversation(endpoint.clone(), 2).await;

    let evaluator = JudgeEvaluator::new(endpoint.clone());
    let verdict = conversation.judge(&evaluator, "judge").await.unwrap();

    assert_eq!(verdict.judge_model, "judge");
    assert_eq!(verdict.winner(), Some("Bot 2"));
    assert_eq!(verdict.full_text, VERDICT);
    assert_eq!(conversation.resolve_winner(&verdict), Some(1));

    let requests = endpoint.requests_for("judge").await;
    assert_eq!(requests.len(), 1);
    let (_, messages, system_prompt) = &requests[0];
    assert_eq!(system_prompt, JUDGE_SYSTEM_PROMPT);
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, Role::User);
    assert!(messages[0].content.starts_with("Topic: Is cereal a soup?"));
    assert!(messages[0].content.contains("\nTurn 2:\nBot 1: Cereal is joy.\n"));
    assert!(messages[0]
        .content
        .ends_with("Please analyze this conversation and declare a winner."));
}

#[tokio::test]
async fn test_judge_without_winner_line_is_undetermined() {
    let endpoint = Arc::new(ScriptedEndpoint::new(&[
        ("ann", "a"),
        ("bob", "b"),
        ("judge", "I enjoyed this debate a lot."),
    ]));
    let conversation = finished_conversation(endpoint.clone(), 1).await;

    let verdict = conversation
        .judge(&JudgeEvaluator::new(endpoint), "judge")
        .await
        .unwrap();
    assert_eq!(verdict.outcome, VerdictOutcome::Undetermined);
    assert_eq!(verdict.winner_raw(), UNDETERMINED_WINNER);
    assert_eq!(verdict.full_text, "I enjoyed this debate a lot.");
    assert_eq!(conversation.resolve_winner(&verdict), None);
}

#[tokio::test]
async fn test_judge_failure_yields_diagnostic_verdict() {
    let endpoint = Arc::new(ScriptedEndpoint::new(&[("ann", "a"), ("bob", "b")]));
    let conversation = finished_conversation(endpoint.clone(), 1).await;

    let verdict = conversation
        .judge(&JudgeEvaluator::new(endpoint), "missing-judge")
        .await
        .unwrap();
    assert!(!verdict.is_determined());
    assert!(verdict.full_text.starts_with(GENERATION_ERROR_PREFIX));
    assert!(verdict.full_text.contains("404"));
}

#[tokio::test]
async fn test_judge_events() {
    let endpoint = Arc::new(ScriptedEndpoint::new(&[
        ("ann", "a"),
        ("bob", "b"),
        ("judge", VERDICT),
    ]));
    let conversation = finished_conversation(endpoint.clone(), 1).await;

    let recorder = Arc::new(EventRecorder::default());
    let evaluator = JudgeEvaluator::new(endpoint).with_event_handler(recorder.clone());
    conversation.judge(&evaluator, "judge").await.unwrap();

    let events = recorder.events.lock().await.clone();
    assert_eq!(events.len(), 2);
    assert!(matches!(
        &events[0],
        ConversationEvent::JudgeStarted { judge_model, .. } if judge_model == "judge"
    ));
    assert!(matches!(
        &events[1],
        ConversationEvent::VerdictReached { winner, determined: true, .. } if winner == "Bot 2"
    ));
}

#[tokio::test]
async fn test_custom_rubric_is_sent() {
    let endpoint = Arc::new(ScriptedEndpoint::new(&[
        ("ann", "a"),
        ("bob", "b"),
        ("judge", "WINNER: Bot 1"),
    ]));
    let conversation = finished_conversation(endpoint.clone(), 1).await;

    let evaluator = JudgeEvaluator::new(endpoint.clone())
        .with_system_prompt("Pick the funniest. Answer with WINNER: <name>.");
    let verdict = conversation.judge(&evaluator, "judge").await.unwrap();

    assert_eq!(conversation.resolve_winner(&verdict), Some(0));
    let requests = endpoint.requests_for("judge").await;
    assert_eq!(requests[0].2, "Pick the funniest. Answer with WINNER: <name>.");
}
