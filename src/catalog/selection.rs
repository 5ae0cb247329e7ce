//! Narrowing a loaded catalog down to the samples of one launch.

use super::sample::Sample;
use crate::error::CatalogError;

/// Operator-supplied filter applied to the loaded samples.
///
/// Filters run in field order: explicit indices first, then dataset
/// substrings, then the limit. An empty selection keeps every sample.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleSelection {
    /// Positions in the loaded sample sequence to keep, in this order.
    pub indices: Vec<usize>,
    /// Keep samples whose dataset contains any of these substrings.
    pub matching: Vec<String>,
    /// Maximum number of samples to keep.
    pub limit: Option<usize>,
}

impl SampleSelection {
    /// Creates a selection that keeps everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps only the samples at these positions.
    pub fn with_indices(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.indices = indices.into_iter().collect();
        self
    }

    /// Keeps only datasets containing one of `patterns`.
    pub fn with_matching<S: Into<String>>(mut self, patterns: impl IntoIterator<Item = S>) -> Self {
        self.matching = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Caps the number of selected samples.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns true when the selection keeps every sample.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty() && self.matching.is_empty() && self.limit.is_none()
    }

    /// Applies the selection.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::SelectionOutOfRange` if an index is past the
    /// end of `samples`.
    pub fn apply(&self, samples: Vec<Sample>) -> Result<Vec<Sample>, CatalogError> {
        let mut selected = if self.indices.is_empty() {
            samples
        } else {
            let len = samples.len();
            self.indices
                .iter()
                .map(|&index| {
                    samples
                        .get(index)
                        .cloned()
                        .ok_or(CatalogError::SelectionOutOfRange { index, len })
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        if !self.matching.is_empty() {
            selected.retain(|s| self.matching.iter().any(|m| s.dataset.contains(m.as_str())));
        }

        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }

        Ok(selected)
    }
}
