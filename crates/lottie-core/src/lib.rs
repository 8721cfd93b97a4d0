//! Translates Lottie documents into composition graphs.
//!
//! [`translate`] walks a parsed [`LottieJson`] and produces a
//! [`CompositionGraph`] whose animations are all driven by one scalar
//! property on the root visual. A host plays the result by animating that
//! property from 0 to 1 over [`Translation::duration`].
//!
//! Features the graph cannot express are recorded as issues. In strict mode
//! the first issue fails the translation instead.

pub mod animatable;
pub mod error;
pub mod expressions;
pub mod graph;
pub mod issues;
pub mod optimizer;
pub mod translator;

use std::time::Duration;

use lottie_data::model::LottieJson;

pub use error::TranslateError;
pub use expressions::{Expression, ExpressionError};
pub use graph::{CompositionGraph, CompositionObject, NodeId};
pub use translator::{Translator, PROGRESS_PROPERTY};

/// Options controlling a translation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslateOptions {
    /// Fail on the first unsupported feature instead of recording it.
    pub strict: bool,
    /// Attach descriptive comments to the created objects.
    pub annotate: bool,
}

/// A translated composition.
#[derive(Debug, Clone)]
pub struct Translation {
    pub graph: CompositionGraph,
    /// The root container visual. It owns the progress property.
    pub root: NodeId,
    pub width: f32,
    pub height: f32,
    pub duration: Duration,
    /// Name of the scalar property on `root` that drives every animation.
    pub progress_property: &'static str,
    /// Unsupported features that were skipped, in the order found.
    pub issues: Vec<String>,
}

/// Translates `document` into a composition graph.
pub fn translate(
    document: &LottieJson,
    options: &TranslateOptions,
) -> Result<Translation, TranslateError> {
    Translator::new(document, options).translate()
}
