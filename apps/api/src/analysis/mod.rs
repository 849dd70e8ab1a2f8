// Assignment analyzer: grading prompt → model call → extraction → batch aggregate.
// All LLM calls go through llm_client; no direct Gemini calls here.

pub mod aggregator;
pub mod extractor;
pub mod handlers;
pub mod prompt_builder;
pub mod prompts;
