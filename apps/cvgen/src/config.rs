use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::generation::enricher::DEFAULT_BULLET_PFR_YIELD;
use crate::generation::trimmer::TrimRatios;
use crate::layout::density::DensityPolicy;

pub const DEFAULT_DOMAIN: &str = "finance";
pub const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 30;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub rust_log: String,
    pub default_domain: String,
    pub tunables: Tunables,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            default_domain: std::env::var("CV_DEFAULT_DOMAIN")
                .unwrap_or_else(|_| DEFAULT_DOMAIN.to_string()),
            tunables: Tunables::from_lookup(|key| std::env::var(key).ok())?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Engine knobs. Every empirical constant of the convergence loop lives here so a
/// different template can be recalibrated without code changes.
#[derive(Debug, Clone)]
pub struct Tunables {
    pub policy: DensityPolicy,
    /// Fill gained per added bullet, in percentage points.
    pub bullet_pfr_yield: f64,
    pub trim_ratios: TrimRatios,
    pub render_timeout: Duration,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            policy: DensityPolicy::lenient(),
            bullet_pfr_yield: DEFAULT_BULLET_PFR_YIELD,
            trim_ratios: TrimRatios::default(),
            render_timeout: Duration::from_secs(DEFAULT_RENDER_TIMEOUT_SECS),
        }
    }
}

impl Tunables {
    /// Builds tunables from a key lookup, falling back to defaults for absent keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut tunables = Tunables::default();

        if let Some(mode) = lookup("CV_DENSITY_MODE") {
            tunables.policy = match mode.trim().to_lowercase().as_str() {
                "lenient" => DensityPolicy::lenient(),
                "strict" => DensityPolicy::strict(),
                other => bail!("CV_DENSITY_MODE must be 'lenient' or 'strict', got '{other}'"),
            };
        }

        if let Some(raw) = lookup("CV_BLOCK_THRESHOLD") {
            let threshold: f64 = raw
                .trim()
                .parse()
                .context("CV_BLOCK_THRESHOLD must be a number")?;
            if !(0.0..=100.0).contains(&threshold) {
                bail!("CV_BLOCK_THRESHOLD must be between 0 and 100");
            }
            tunables.policy = tunables.policy.with_block_threshold(threshold);
        }

        if let Some(raw) = lookup("CV_BULLET_PFR_YIELD") {
            let value: f64 = raw
                .trim()
                .parse()
                .context("CV_BULLET_PFR_YIELD must be a number")?;
            if value <= 0.0 {
                bail!("CV_BULLET_PFR_YIELD must be positive");
            }
            tunables.bullet_pfr_yield = value;
        }

        if let Some(raw) = lookup("CV_RENDER_TIMEOUT_SECS") {
            let secs: u64 = raw
                .trim()
                .parse()
                .context("CV_RENDER_TIMEOUT_SECS must be a whole number of seconds")?;
            tunables.render_timeout = Duration::from_secs(secs.max(1));
        }

        Ok(tunables)
    }
}
