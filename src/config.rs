//! Compiler configuration.
//!
//! Settings come from an optional JSON file and the command line. Every
//! field of the file is optional; flags given on the command line win.

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Class name used when none can be derived from the input.
pub const DEFAULT_CLASS_NAME: &str = "Composition";

/// What the compiler writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// A C# instantiator class.
    #[default]
    Cs,
    /// A C++/CX instantiator class.
    Cx,
    /// Only the list of unsupported features.
    Issues,
}

impl Target {
    /// The code generator for this target, if it generates code.
    pub fn codegen(self) -> Option<lottie_codegen::Target> {
        match self {
            Target::Cs => Some(lottie_codegen::Target::CSharp),
            Target::Cx => Some(lottie_codegen::Target::Cx),
            Target::Issues => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    /// Fail on the first unsupported feature.
    pub strict: bool,
    /// Attach descriptive comments to the generated objects.
    pub annotate: bool,
    /// Name of the generated class. Derived from the input file when unset.
    pub class_name: Option<String>,
    pub target: Target,
}

impl CompilerConfig {
    /// Reads a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn translate_options(&self) -> lottie_core::TranslateOptions {
        lottie_core::TranslateOptions {
            strict: self.strict,
            annotate: self.annotate,
        }
    }

    /// The configured class name, or one derived from `input`.
    pub fn class_name_for(&self, input: &Path) -> String {
        match &self.class_name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => class_name_from_path(input),
        }
    }
}

/// PascalCase class name from the file stem of `path`.
///
/// Characters that are not ASCII alphanumeric are dropped and the character
/// after each of them is upper-cased. A leading digit gets a `_` prefix.
pub fn class_name_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy())
        .unwrap_or_default();

    let mut name = String::with_capacity(stem.len());
    let mut upper_next = true;
    for c in stem.chars() {
        if c.is_ascii_alphanumeric() {
            if upper_next {
                name.push(c.to_ascii_uppercase());
            } else {
                name.push(c);
            }
            upper_next = false;
        } else {
            upper_next = true;
        }
    }

    match name.chars().next() {
        None => DEFAULT_CLASS_NAME.to_string(),
        Some(first) if first.is_ascii_digit() => format!("_{name}"),
        Some(_) => name,
    }
}
