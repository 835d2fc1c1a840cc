//! Project health analysis over a GitHub reports repository.
//!
//! Resolves each open pull request to a project, collects the reports that
//! mention it, and runs a two-stage LLM analysis whose progress is persisted
//! after every step.

pub mod collector;
pub mod github;
pub mod llm;
pub mod matcher;
pub mod orchestrator;
pub mod pipeline;
pub mod prompt;
pub mod resolver;
pub mod sink;
pub mod source;

#[cfg(test)]
mod testing;
