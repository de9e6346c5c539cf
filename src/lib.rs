#![forbid(unsafe_code)]

pub mod batch;
pub mod blueprint;
pub mod chapter;
pub mod cli;
pub mod consistency;
pub mod finalize;
pub mod history;
pub mod llm;
pub mod logging;
pub mod openai;
pub mod prompts;
pub mod retrieval;
pub mod summary;
pub mod vectorstore;
