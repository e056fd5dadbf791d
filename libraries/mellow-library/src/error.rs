/// Library-specific errors
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `LibraryError`
pub type Result<T> = std::result::Result<T, LibraryError>;

/// Library error types
#[derive(Error, Debug)]
pub enum LibraryError {
    /// Scan root or audio file does not exist
    #[error("Not found: {}", .0.display())]
    NotFound(PathBuf),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Lofty error
    #[error(transparent)]
    Lofty(#[from] lofty::error::LoftyError),

    /// Error from a core collaborator
    #[error(transparent)]
    Core(#[from] mellow_core::MellowError),
}

impl From<LibraryError> for mellow_core::MellowError {
    fn from(err: LibraryError) -> Self {
        match err {
            LibraryError::NotFound(path) => {
                mellow_core::MellowError::not_found("path", path.display().to_string())
            }
            LibraryError::Io(e) => mellow_core::MellowError::Io(e),
            LibraryError::Core(e) => e,
            LibraryError::Lofty(e) => mellow_core::MellowError::storage(e.to_string()),
        }
    }
}
