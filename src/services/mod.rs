pub mod console;
pub mod episode;
pub mod export;
pub mod library;
pub mod llm;
pub mod prompt;
pub mod script;
pub mod setup;
pub mod workflow;
