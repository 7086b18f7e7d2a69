use thiserror::Error;

/// Mirrors spec.md §4.7's "bounded MAX_SEPARATORS; exceed = fatal".
#[derive(Debug, Error)]
pub enum VisError {
    #[error("portal flow generated more than {max} separator planes for one stack frame")]
    TooManySeparators { max: usize },
}
