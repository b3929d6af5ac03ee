//! LLM reflector (§4.6): builds the reflection prompt from an aggregation
//! window, calls the configured [`LlmClient`], validates the response
//! shape, and writes the durable reasoning log before a `Proposal` is ever
//! constructed from it.

mod client;
mod prompt;
mod reasoning_log;
mod schema;

pub use client::{HttpLlmClient, LlmClient};
pub use prompt::{system_prompt, user_prompt};
pub use reasoning_log::{reasoning_log_path, write_reasoning_log};
pub use schema::{validate_llm_output, SchemaError, ValidatedLlmOutput};
