//! Limits applied by [`JobIndexClient`](crate::JobIndexClient) before a bulk
//! request reaches the engine.

use crate::errors::SearchError;

/// Largest bulk request accepted unless configured otherwise.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchIndexConfig {
    /// Documents allowed in one bulk request; `None` disables the check.
    pub max_batch_size: Option<usize>,
}

impl Default for SearchIndexConfig {
    fn default() -> Self {
        Self::with_max_batch_size(DEFAULT_MAX_BATCH_SIZE)
    }
}

impl SearchIndexConfig {
    /// No limit at all. The engine's own request size limit still applies.
    pub fn unlimited() -> Self {
        Self {
            max_batch_size: None,
        }
    }

    pub fn with_max_batch_size(max_batch_size: usize) -> Self {
        Self {
            max_batch_size: Some(max_batch_size),
        }
    }

    /// A limit that admits chunks of `batch_size` documents, never lower
    /// than the default.
    pub fn for_batch_size(batch_size: usize) -> Self {
        Self::with_max_batch_size(batch_size.max(DEFAULT_MAX_BATCH_SIZE))
    }

    /// Reject a bulk request of `size` documents above the limit.
    pub fn check(&self, size: usize) -> Result<(), SearchError> {
        match self.max_batch_size {
            Some(max) if size > max => Err(SearchError::batch_size_exceeded(size, max)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_limits() {
        let config = SearchIndexConfig::with_max_batch_size(2);
        assert!(config.check(2).is_ok());
        assert!(matches!(
            config.check(3),
            Err(SearchError::BatchSizeExceeded { provided: 3, max: 2 })
        ));
        assert!(SearchIndexConfig::unlimited().check(usize::MAX).is_ok());
    }

    #[test]
    fn test_for_batch_size_never_lowers_default() {
        assert_eq!(
            SearchIndexConfig::for_batch_size(50).max_batch_size,
            Some(DEFAULT_MAX_BATCH_SIZE)
        );
        assert_eq!(SearchIndexConfig::for_batch_size(5000).max_batch_size, Some(5000));
    }
}
