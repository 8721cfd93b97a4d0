use thiserror::Error;

/// Reasons code generation can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodegenError {
    /// The object has no factory in the chosen target.
    #[error("cannot generate a factory for {0}")]
    UnsupportedNode(String),
    /// The translation's root is not a visual in its graph.
    #[error("the translation has no root visual")]
    MissingRoot,
}
