// Density convergence: base generation, enrichment, trimming and the controller
// that bounds them to a single corrective pass per language.
// All LLM calls go through llm_client via the ContentGenerator trait.

pub mod blocking;
pub mod controller;
pub mod enricher;
pub mod generator;
pub mod padding;
pub mod prompts;
pub mod trimmer;

pub use controller::ConvergenceController;
pub use generator::{ContentGenerator, LlmContentGenerator};
