//! Concrete [`ModelEndpoint`](crate::endpoint::ModelEndpoint) implementations.
//!
//! Each submodule speaks one server's HTTP API while conforming to the single
//! `generate(model, messages, system_prompt)` contract the orchestrator relies on.

pub mod common;

pub mod ollama;
pub mod openai;
