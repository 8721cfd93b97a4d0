//! Unsupported-feature bookkeeping for a single translation.

use tracing::warn;

use crate::error::TranslateError;

/// De-duplicated list of unsupported features, in first-recorded order.
///
/// In strict mode the first recorded issue aborts the translation.
#[derive(Debug, Clone, Default)]
pub struct Issues {
    strict: bool,
    recorded: Vec<String>,
}

impl Issues {
    pub fn new(strict: bool) -> Self {
        Self {
            strict,
            recorded: Vec::new(),
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Records `details`. Returns an error when running in strict mode.
    pub fn unsupported(&mut self, details: impl Into<String>) -> Result<(), TranslateError> {
        let details = details.into();
        if !self.recorded.contains(&details) {
            warn!(issue = %details, "unsupported feature");
            self.recorded.push(details.clone());
        }
        if self.strict {
            return Err(TranslateError::Unsupported(details));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.recorded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recorded.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.recorded.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.recorded
    }
}
