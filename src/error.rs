//! Errors raised by the document handler.

use std::path::PathBuf;

/// Error returned by [`DocHandler`](crate::handler::DocHandler)
///
/// Only a missing source file is detected locally. Everything else comes
/// from the automation layer and is carried through as-is.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("could not find file: {}", .path.display())]
    ResourceNotFound { path: PathBuf },

    #[error(transparent)]
    Automation(#[from] anyhow::Error),
}

impl HandlerError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, HandlerError::ResourceNotFound { .. })
    }
}
