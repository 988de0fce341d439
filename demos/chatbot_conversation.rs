//! Multi-model chatbot conversation against a local Ollama server.
//!
//! Three persona-bound agents discuss a topic for a few turns, then a judge model picks a
//! winner and the whole exchange is written to `conversation.md` and `conversation.json`.
//!
//! ```text
//! cargo run --example chatbot_conversation                  # defaults
//! cargo run --example chatbot_conversation -- config.json   # ConversationConfig as JSON
//! RUST_LOG=parley=debug OLLAMA_HOST=http://gpu-box:11434 cargo run --example chatbot_conversation
//! ```

use async_trait::async_trait;
use parley::clients::ollama::OllamaClient;
use parley::config::{AgentConfig, ConversationConfig};
use parley::event::{ConversationEvent, EventHandler};
use parley::{export, ConversationOrchestrator, JudgeEvaluator};
use std::sync::Arc;

struct ConsolePrinter;

#[async_trait]
impl EventHandler for ConsolePrinter {
    async fn on_conversation_event(&self, event: &ConversationEvent) {
        match event {
            ConversationEvent::TurnStarted { turn, .. } => println!("\n--- Turn {} ---", turn),
            ConversationEvent::AgentResponded {
                agent_name, message, ..
            } => println!("{}: {}", agent_name, message),
            ConversationEvent::AgentFailed {
                agent_name, error, ..
            } => println!("{}: (failed: {})", agent_name, error),
            ConversationEvent::JudgeStarted { judge_model, .. } => {
                println!("\nCalling the judge ({})...", judge_model)
            }
            _ => {}
        }
    }
}

fn load_config() -> Result<ConversationConfig, Box<dyn std::error::Error>> {
    let mut config = match std::env::args().nth(1) {
        Some(path) => ConversationConfig::from_json_file(path)?,
        None => ConversationConfig {
            max_turns: 3,
            ..ConversationConfig::default()
        },
    };
    if let Ok(host) = std::env::var("OLLAMA_HOST") {
        config.endpoint.base_url = host;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    parley::init_logger();

    let mut config = load_config()?;
    let client = Arc::new(OllamaClient::new(config.endpoint.clone())?);

    if !client.check_connection().await {
        eprintln!(
            "Ollama is not reachable at {}. Start it with `ollama serve`.",
            config.endpoint.base_url
        );
        return Ok(());
    }

    if config.agents.is_empty() {
        let models = client.available_models().await?;
        let Some(first) = models.first() else {
            eprintln!("No models installed. Try `ollama pull llama3.2`.");
            return Ok(());
        };
        let model_for = |i: usize| models.get(i).unwrap_or(first).clone();
        config.agents = vec![
            AgentConfig::new("Bot 1", model_for(0), "Optimist"),
            AgentConfig::new("Bot 2", model_for(1), "Skeptic"),
            AgentConfig::new("Bot 3", model_for(2), "Comedian"),
        ];
        config.judge_model.get_or_insert_with(|| first.clone());
    }

    let printer: Arc<dyn EventHandler> = Arc::new(ConsolePrinter);
    let mut conversation = ConversationOrchestrator::from_config(&config, client.clone())?
        .with_event_handler(printer.clone());

    conversation.initialize(&config.topic).await?;
    println!("Topic: {}\n", conversation.topic());
    for agent in conversation.agents() {
        if let Some(opening) = agent.opening_statement() {
            println!("{} [{} / {}]: {}", agent.name, agent.model, agent.persona, opening);
        }
    }

    conversation.run_to_completion().await?;

    let verdict = match &config.judge_model {
        Some(judge_model) => {
            let judge = JudgeEvaluator::new(client).with_event_handler(printer);
            let verdict = conversation.judge(&judge, judge_model).await?;
            println!("\n{}", verdict.full_text);
            match conversation.resolve_winner(&verdict) {
                Some(index) => println!("\nWinner: {}", conversation.agents()[index].name),
                None => println!("\nWinner: {}", verdict.winner_raw()),
            }
            Some(verdict)
        }
        None => None,
    };

    let stats = conversation.stats();
    println!(
        "\n{} turn(s), {} message(s), {} failed, {} participant(s)",
        stats.total_turns, stats.total_messages, stats.failed_messages, stats.participants
    );

    let markdown = export::to_markdown(
        conversation.state(),
        conversation.transcript(),
        verdict.as_ref(),
    );
    let json = export::to_json(
        conversation.state(),
        conversation.transcript(),
        verdict.as_ref(),
        conversation.personas(),
    )?;
    std::fs::write("conversation.md", markdown)?;
    std::fs::write("conversation.json", json)?;
    println!("Saved conversation.md and conversation.json");

    Ok(())
}
