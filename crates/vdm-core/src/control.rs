//! Cooperative cancellation tokens.
//!
//! Each job gets one token at creation. The fetch collaborator checks the
//! token at every progress emission boundary and aborts when it reads true;
//! nothing here forcibly interrupts a running fetch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag for one job. Cloning shares the flag.
/// The flag is monotonic: once requested, it stays set.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn request(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// True once cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_starts_clear_and_latches() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        token.request();
        assert!(token.is_cancelled());
        token.request();
        assert!(token.is_cancelled());
    }

    #[test]
    fn clones_share_the_flag() {
        let token = CancelToken::new();
        let seen_by_worker = token.clone();
        token.request();
        assert!(seen_by_worker.is_cancelled());
    }
}
