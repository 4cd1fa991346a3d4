//! Splits project names into bounded groups so each composite query stays
//! under the upstream's request size and complexity limits.

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum BatchError {
    #[error("batch size must be positive, got {0}")]
    InvalidSize(usize),
}

/// Returns contiguous, order-preserving batches of at most `size` items.
/// The final batch may be smaller. Empty input yields no batches.
pub fn batches<T>(items: &[T], size: usize) -> Result<std::slice::Chunks<'_, T>, BatchError> {
    if size == 0 {
        return Err(BatchError::InvalidSize(size));
    }
    Ok(items.chunks(size))
}
