// Resume matching: keyword fit scoring, LLM assessment, batch ranking.
// All LLM calls go through llm_client.

pub mod evaluator;
pub mod handlers;
pub mod keywords;
pub mod prompts;
pub mod ranker;
