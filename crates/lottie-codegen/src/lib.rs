//! Canonicalizes composition graphs and emits instantiator source code.
//!
//! [`generate`] walks the graph of a [`Translation`] from its root, merges
//! equivalent objects, decides which objects are cached in fields and which
//! are created inline, then writes a class with one factory per remaining
//! object. The same plan is rendered as C# or C++/CX.
//!
//! Output is deterministic: the same translation always produces the same
//! text.

pub mod canonicalizer;
mod code_builder;
mod csharp;
mod cx;
mod error;
mod generator;
pub mod object_graph;
pub mod stringifier;

use lottie_core::Translation;
use tracing::info;

pub use code_builder::CodeBuilder;
pub use error::CodegenError;
pub use stringifier::{CSharpStringifier, CppStringifier, Stringifier};

use generator::{check_root, InstantiatorGenerator, Language};

/// Language of the generated instantiator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    CSharp,
    Cx,
}

impl Target {
    /// File extension of the generated source.
    pub fn extension(self) -> &'static str {
        match self {
            Target::CSharp => CSharpStringifier.extension(),
            Target::Cx => CppStringifier.extension(),
        }
    }
}

/// One generated source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedCode {
    pub file_name: String,
    pub text: String,
}

/// Object counts before and after canonicalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphSummary {
    /// Objects reachable from the root.
    pub raw_nodes: usize,
    /// Distinct objects after merging equivalent ones.
    pub canonical_nodes: usize,
}

/// Counts the objects of `translation` as the generator sees them.
pub fn summarize(translation: &Translation, annotate: bool) -> Result<GraphSummary, CodegenError> {
    check_root(&translation.graph, translation.root)?;
    let objects = object_graph::ObjectGraph::walk(&translation.graph, translation.root);
    let canonical = canonicalizer::canonicalize(&translation.graph, &objects, !annotate);
    Ok(GraphSummary {
        raw_nodes: objects.len(),
        canonical_nodes: canonical.canonical_count(),
    })
}

/// Generates the instantiator class `class_name` for `translation`.
///
/// Comments attached to objects are written only when `annotate` is set.
pub fn generate(
    translation: &Translation,
    target: Target,
    class_name: &str,
    annotate: bool,
) -> Result<GeneratedCode, CodegenError> {
    let (text, factories) = match target {
        Target::CSharp => render(CSharpStringifier, translation, class_name, annotate)?,
        Target::Cx => render(CppStringifier, translation, class_name, annotate)?,
    };
    let file_name = format!("{class_name}.{}", target.extension());
    info!(file = %file_name, factories, "generated instantiator");
    Ok(GeneratedCode { file_name, text })
}

fn render<L: Language>(
    language: L,
    translation: &Translation,
    class_name: &str,
    annotate: bool,
) -> Result<(String, usize), CodegenError> {
    let generator = InstantiatorGenerator::new(language, translation, annotate)?;
    Ok((generator.generate(class_name)?, generator.factory_count()))
}
