pub mod config;
pub mod errors;
pub mod extraction;
pub mod generation;
pub mod layout;
pub mod llm_client;
pub mod models;
pub mod render;
pub mod richness;

#[cfg(test)]
mod testing;
