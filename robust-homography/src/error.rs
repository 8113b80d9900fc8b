use thiserror::Error;

/// Reasons a robust homography call can fail.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("at least 4 correspondences are required, got {found}")]
    InsufficientPoints { found: usize },
    #[error("no valid hypothesis after {trials} minimal samples")]
    NoValidHypotheses { trials: usize },
    #[error("homography fails the reference plane heuristics")]
    ImplausibleHomography,
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
