pub mod batch;
pub mod config;
pub mod content;
pub mod llm_utils;
pub mod normalizer;
pub mod poster;
pub mod prompts;
pub mod requester;
