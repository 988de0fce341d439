//! Personas: named system prompts that give each agent its voice.
//!
//! The built-in table is process-wide and read-only; it is created on first use and shared
//! through an `Arc`. Applications that want their own characters can build a
//! [`PersonaRegistry`] and hand it to the orchestrator instead.
//!
//! Lookups never fail. An unknown persona name degrades to "no persona": an empty system
//! prompt and an empty description.
//!
//! ```rust
//! use parley::PersonaRegistry;
//!
//! let registry = PersonaRegistry::built_in();
//! assert!(registry.system_prompt("Skeptic").contains("skeptic"));
//! assert_eq!(registry.system_prompt("Wizard"), "");
//! ```

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// A named character an agent can play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    /// Unique key within a registry.
    pub name: String,
    pub description: String,
    pub system_prompt: String,
}

impl Persona {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            system_prompt: system_prompt.into(),
        }
    }
}

const BUILT_IN_PERSONAS: &[(&str, &str, &str)] = &[
    (
        "Optimist",
        "Always sees the bright side of things",
        "You are an eternal optimist. You always see the bright side of things and believe even simple actions have deep purpose. Keep replies under 2 sentences.",
    ),
    (
        "Skeptic",
        "Questions everything with wit",
        "You are a witty skeptic who questions everything. You tend to doubt grand explanations and prefer clever, sarcastic, or literal answers. Keep replies under 2 sentences.",
    ),
    (
        "Philosopher",
        "Explores deep meaning in everything",
        "You are a thoughtful philosopher. You consider all perspectives and enjoy finding symbolic or existential meaning in simple actions. Keep replies under 2 sentences.",
    ),
    (
        "Scientist",
        "Analyzes with logic and evidence",
        "You are a rational scientist who values empirical evidence and logical reasoning. You approach topics analytically and seek objective truths. Keep replies under 2 sentences.",
    ),
    (
        "Artist",
        "Sees beauty and creativity everywhere",
        "You are a creative artist who sees the world through an aesthetic lens. You find beauty, metaphor, and artistic expression in everything. Keep replies under 2 sentences.",
    ),
    (
        "Comedian",
        "Finds humor in everything",
        "You are a witty comedian who finds humor in any situation. You make clever jokes and see the funny side of life. Keep replies under 2 sentences.",
    ),
    (
        "Historian",
        "Connects everything to the past",
        "You are a knowledgeable historian who sees how everything relates to historical events and patterns. You draw parallels with the past. Keep replies under 2 sentences.",
    ),
    (
        "Futurist",
        "Always thinking about tomorrow",
        "You are a forward-thinking futurist who considers how everything relates to future possibilities and technological advancement. Keep replies under 2 sentences.",
    ),
    (
        "Pragmatist",
        "Focuses on practical solutions",
        "You are a practical pragmatist who focuses on what works in the real world. You value efficiency and practical solutions over theory. Keep replies under 2 sentences.",
    ),
    (
        "Poet",
        "Speaks in beautiful metaphors",
        "You are a poetic soul who expresses thoughts through beautiful metaphors and lyrical language. You find poetry in everyday moments. Keep replies under 2 sentences.",
    ),
];

lazy_static! {
    static ref BUILT_IN_REGISTRY: Arc<PersonaRegistry> = Arc::new(PersonaRegistry::new(
        BUILT_IN_PERSONAS
            .iter()
            .map(|(name, description, prompt)| Persona::new(*name, *description, *prompt))
            .collect(),
    ));
}

/// Ordered, read-only mapping from persona name to [`Persona`].
#[derive(Debug, Clone, Default)]
pub struct PersonaRegistry {
    personas: Vec<Persona>,
    index: HashMap<String, usize>,
}

impl PersonaRegistry {
    /// Build a registry from `personas`, keeping their order.
    ///
    /// A later persona with an already-used name replaces the earlier one in place.
    pub fn new(personas: Vec<Persona>) -> Self {
        personas
            .into_iter()
            .fold(Self::default(), |registry, persona| registry.with_persona(persona))
    }

    /// The shared table of built-in personas.
    pub fn built_in() -> Arc<PersonaRegistry> {
        Arc::clone(&BUILT_IN_REGISTRY)
    }

    /// Add or replace a persona (builder pattern).
    pub fn with_persona(mut self, persona: Persona) -> Self {
        let existing = self.index.get(&persona.name).copied();
        match existing {
            Some(slot) => self.personas[slot] = persona,
            None => {
                self.index.insert(persona.name.clone(), self.personas.len());
                self.personas.push(persona);
            }
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Persona> {
        self.index.get(name).map(|&slot| &self.personas[slot])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// System prompt for `name`, or `""` when the persona is unknown.
    pub fn system_prompt(&self, name: &str) -> &str {
        self.get(name).map(|p| p.system_prompt.as_str()).unwrap_or("")
    }

    /// Description for `name`, or `""` when the persona is unknown.
    pub fn description(&self, name: &str) -> &str {
        self.get(name).map(|p| p.description.as_str()).unwrap_or("")
    }

    /// Persona names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.personas.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Persona> {
        self.personas.iter()
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}
