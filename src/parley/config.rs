//! Configuration for a conversation and the endpoint it talks to.
//!
//! Both structs are plain data with sensible defaults, so they can be built by hand. They
//! also derive `serde` so an application can keep them in a JSON file and load them with
//! [`ConversationConfig::from_json_file`].
//!
//! # Example
//!
//! ```rust
//! use parley::config::{AgentConfig, ConversationConfig};
//!
//! let config = ConversationConfig {
//!     topic: "Should AI have rights?".into(),
//!     max_turns: 3,
//!     agents: vec![
//!         AgentConfig::new("Bot 1", "llama3.2", "Optimist"),
//!         AgentConfig::new("Bot 2", "mistral", "Skeptic"),
//!     ],
//!     judge_model: Some("phi3".into()),
//!     ..ConversationConfig::default()
//! };
//!
//! assert!(config.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::path::Path;

/// Smallest accepted number of turns.
pub const MIN_TURNS: usize = 1;
/// Largest accepted number of turns.
pub const MAX_TURNS: usize = 10;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_TOPIC: &str = "Why did the chicken cross the road?";
const DEFAULT_TURNS: usize = 5;

/// Settings shared by the HTTP endpoint adapters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Root URL of the model server, without a trailing path.
    pub base_url: String,
    /// Fixed per-call budget; a call exceeding it is a failed generation.
    pub timeout_secs: u64,
    pub temperature: f32,
    /// Upper bound on generated tokens per reply.
    pub num_predict: u32,
    /// Bearer token for OpenAI-compatible servers. Ollama ignores it.
    pub api_key: Option<String>,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 60,
            temperature: 0.7,
            num_predict: 150,
            api_key: None,
        }
    }
}

/// One participant as the user configured it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,
    pub model: String,
    pub persona: String,
}

impl AgentConfig {
    pub fn new(name: impl Into<String>, model: impl Into<String>, persona: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            persona: persona.into(),
        }
    }
}

/// Everything the orchestrator consumes when a conversation starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    pub topic: String,
    pub max_turns: usize,
    pub agents: Vec<AgentConfig>,
    /// `None` means the conversation ends without a verdict.
    pub judge_model: Option<String>,
    pub endpoint: EndpointConfig,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            topic: DEFAULT_TOPIC.to_string(),
            max_turns: DEFAULT_TURNS,
            agents: Vec::new(),
            judge_model: None,
            endpoint: EndpointConfig::default(),
        }
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "could not read config: {}", err),
            ConfigError::Parse(err) => write!(f, "could not parse config: {}", err),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}

impl ConversationConfig {
    /// Parse a configuration from JSON text and validate it.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: ConversationConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&text)?;
        log::debug!(
            "parley::config: loaded {} agent(s) from {}",
            config.agents.len(),
            path.display()
        );
        Ok(config)
    }

    /// Check the bounds a conversation needs before any generation starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agents.is_empty() {
            return Err(ConfigError::Invalid("at least one agent is required".into()));
        }
        if !(MIN_TURNS..=MAX_TURNS).contains(&self.max_turns) {
            return Err(ConfigError::Invalid(format!(
                "max_turns must be between {} and {}, got {}",
                MIN_TURNS, MAX_TURNS, self.max_turns
            )));
        }
        if self.topic.trim().is_empty() {
            return Err(ConfigError::Invalid("topic must not be empty".into()));
        }
        for (index, agent) in self.agents.iter().enumerate() {
            if agent.model.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "agent {} ('{}') has no model",
                    index + 1,
                    agent.name
                )));
            }
        }
        if let Some(judge) = &self.judge_model {
            if judge.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "judge_model must be omitted or non-empty".into(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_agents() -> Vec<AgentConfig> {
        vec![
            AgentConfig::new("Bot 1", "llama3.2", "Optimist"),
            AgentConfig::new("Bot 2", "mistral", "Skeptic"),
        ]
    }

    #[test]
    fn defaults_match_local_ollama() {
        let config = EndpointConfig::default();
        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.num_predict, 150);
    }

    #[test]
    fn rejects_empty_agent_list() {
        let config = ConversationConfig::default();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_out_of_range_turns() {
        for turns in [0, MAX_TURNS + 1] {
            let config = ConversationConfig {
                max_turns: turns,
                agents: two_agents(),
                ..ConversationConfig::default()
            };
            assert!(config.validate().is_err(), "turns = {}", turns);
        }
    }

    #[test]
    fn rejects_blank_judge_model() {
        let config = ConversationConfig {
            agents: two_agents(),
            judge_model: Some("  ".into()),
            ..ConversationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let json = r#"{
            "agents": [{"name": "Bot 1", "model": "llama3.2", "persona": "Poet"}],
            "max_turns": 2
        }"#;
        let config = ConversationConfig::from_json_str(json).unwrap();
        assert_eq!(config.max_turns, 2);
        assert_eq!(config.topic, DEFAULT_TOPIC);
        assert_eq!(config.endpoint, EndpointConfig::default());
        assert!(config.judge_model.is_none());
    }
}
