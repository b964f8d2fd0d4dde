/// Result type for property operations.
pub type Result<T> = std::result::Result<T, PropertyError>;

/// Errors returned by property mutators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PropertyError {
    #[error("index out of bounds: the len is {len} but the index is {index}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// The target of [`ListChange::apply_to`](crate::ListChange::apply_to) does not hold
    /// the change's old values at its start index.
    #[error("the target does not match the change at index {index}")]
    StaleTarget { index: usize },
}

pub(crate) fn check_index(index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(PropertyError::IndexOutOfBounds { index, len })
    }
}

pub(crate) fn check_insert_index(index: usize, len: usize) -> Result<()> {
    if index <= len {
        Ok(())
    } else {
        Err(PropertyError::IndexOutOfBounds { index, len })
    }
}
