//! Parse, translate and generate in one call.

use anyhow::{Context, Result};
use lottie_codegen::GeneratedCode;
use lottie_data::LottieJson;
use tracing::info;

use crate::config::CompilerConfig;

/// Result of compiling one document.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// Unsupported features that were skipped, in the order found.
    pub issues: Vec<String>,
    /// Generated source, unless the target only reports issues.
    pub code: Option<GeneratedCode>,
}

/// Compiles the Lottie document in `json_text` into the class `class_name`.
pub fn compile(json_text: &str, config: &CompilerConfig, class_name: &str) -> Result<CompileOutput> {
    let document: LottieJson =
        serde_json::from_str(json_text).context("Failed to parse Lottie JSON")?;
    info!(
        name = document.nm.as_deref().unwrap_or(""),
        layers = document.layers.len(),
        "parsed document"
    );

    let translation = lottie_core::translate(&document, &config.translate_options())
        .context("Failed to translate composition")?;
    let summary = lottie_codegen::summarize(&translation, config.annotate)
        .context("Failed to analyze composition graph")?;
    info!(
        nodes = summary.raw_nodes,
        canonical = summary.canonical_nodes,
        issues = translation.issues.len(),
        "translated composition"
    );

    let code = match config.target.codegen() {
        Some(target) => Some(
            lottie_codegen::generate(&translation, target, class_name, config.annotate)
                .with_context(|| format!("Failed to generate {class_name}"))?,
        ),
        None => None,
    };

    Ok(CompileOutput {
        issues: translation.issues,
        code,
    })
}
