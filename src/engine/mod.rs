pub mod engine;
pub mod protocol;

pub mod llm_client;
pub mod orchestrator;
pub mod output_parser;
pub mod prompt_builder;
pub mod prompts;
pub mod templates;
