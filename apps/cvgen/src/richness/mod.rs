// Richness classification of the source document.
// Pure functions only: the classifier decides the enrichment strategy and the
// user-facing warning before any generation happens.

pub mod classifier;
pub mod instructions;

pub use classifier::{classify, structured_input_profile, RichnessProfile, Strategy, Tier};
pub use instructions::{instructions_for, warning_for};
