// src/parley/mod.rs

pub mod agent;
pub mod clients;
pub mod config;
pub mod endpoint;
pub mod event;
pub mod export;
pub mod judge;
pub mod orchestration;
pub mod persona;

// Let's explicitly export the orchestrator so it can be reached as parley::ConversationOrchestrator
// instead of parley::orchestration::ConversationOrchestrator
pub use orchestration::ConversationOrchestrator;
