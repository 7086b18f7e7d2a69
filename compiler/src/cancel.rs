//! Cooperative cancellation (spec.md §5): long-running phases poll a
//! shared flag between brushes/nodes/portals rather than being killed
//! externally, so a cancelled run still leaves `CompileContext` in a
//! consistent, droppable state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::CompileError;

#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Short-circuits the current phase with [`CompileError::Cancelled`]
    /// at a natural polling point (one per brush/node/portal batch).
    pub fn check(&self) -> Result<(), CompileError> {
        if self.is_cancelled() {
            Err(CompileError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncancelled_token_checks_ok() {
        let token = CancelToken::new();
        assert!(token.check().is_ok());
    }

    #[test]
    fn cancelling_makes_check_fail() {
        let token = CancelToken::new();
        token.cancel();
        assert!(matches!(token.check(), Err(CompileError::Cancelled)));
    }
}
