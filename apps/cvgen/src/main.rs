use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cvgen::config::Config;
use cvgen::errors::EngineError;
use cvgen::extraction::SourceInput;
use cvgen::generation::{ConvergenceController, LlmContentGenerator};
use cvgen::layout::DensityPolicy;
use cvgen::llm_client::{self, LlmClient};
use cvgen::models::aliases::normalize_generated;
use cvgen::models::{GenerationResult, Language};
use cvgen::render::TemplateRenderer;

/// Generate a one-page CV (PDF + DOCX) from a résumé.
#[derive(Debug, Parser)]
#[command(name = "cvgen", version, about)]
struct Cli {
    /// Source résumé: .pdf, .json (structured CV) or any text file.
    #[arg(short, long)]
    input: PathBuf,

    /// Target sector, e.g. finance, consulting. Defaults to CV_DEFAULT_DOMAIN.
    #[arg(short, long)]
    domain: Option<String>,

    /// Output language (fr or en). Repeat for several; defaults to both.
    #[arg(short, long = "lang")]
    lang: Vec<Language>,

    /// Directory receiving cv_<lang>.pdf and cv_<lang>.docx.
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Use the strict 90-95% band instead of the lenient 86-95% one.
    #[arg(long)]
    strict: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Load configuration first (fails on missing required env vars)
    let mut config = Config::from_env()?;
    if cli.strict {
        let block_threshold = config.tunables.policy.block_threshold;
        config.tunables.policy = DensityPolicy::strict().with_block_threshold(block_threshold);
    }

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting cvgen v{}", env!("CARGO_PKG_VERSION"));

    let llm = LlmClient::new(config.anthropic_api_key.clone())
        .context("Failed to build LLM client")?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let controller = ConvergenceController::new(
        Arc::new(LlmContentGenerator::new(llm)),
        Arc::new(TemplateRenderer::default()),
        config.tunables.clone(),
    );

    let source = load_input(&cli.input).await?;
    let domain = cli.domain.unwrap_or_else(|| config.default_domain.clone());

    match controller.generate(source, &domain, &cli.lang).await {
        Ok(results) => {
            write_outputs(&cli.out_dir, &results).await?;
            let summary: BTreeMap<_, _> = results
                .iter()
                .map(|(lang, result)| (lang.code(), result.summary()))
                .collect();
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(EngineError::BlockedInput(report)) => {
            eprintln!("{report}");
            Ok(ExitCode::from(2))
        }
        Err(e) => {
            error!("Generation failed: {e}");
            eprintln!("{}", serde_json::to_string_pretty(&e.to_json())?);
            // Bad input is the caller's to fix; everything else is ours.
            Ok(if e.is_user_actionable() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

/// Reads the source file, choosing the input kind from its extension.
async fn load_input(path: &Path) -> Result<SourceInput> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);

    match extension.as_deref() {
        Some("pdf") => {
            let bytes = tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(SourceInput::Pdf(bytes))
        }
        Some("json") => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let value: serde_json::Value =
                serde_json::from_str(&raw).context("Structured input is not valid JSON")?;
            let content =
                normalize_generated(value).context("Structured input is not a valid CV")?;
            Ok(SourceInput::Structured(Box::new(content)))
        }
        _ => {
            let text = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(SourceInput::Text(text))
        }
    }
}

async fn write_outputs(
    out_dir: &Path,
    results: &BTreeMap<Language, GenerationResult>,
) -> Result<()> {
    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    for (lang, result) in results {
        let pdf_path = out_dir.join(format!("cv_{}.pdf", lang.code()));
        let docx_path = out_dir.join(format!("cv_{}.docx", lang.code()));
        tokio::fs::write(&pdf_path, &result.pdf_bytes).await?;
        tokio::fs::write(&docx_path, &result.docx_bytes).await?;
        info!(
            "Wrote {} and {} ({}% fill)",
            pdf_path.display(),
            docx_path.display(),
            result.metrics.fill_percentage
        );
    }
    Ok(())
}
