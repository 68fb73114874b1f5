use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A shared flag that asks long-running analyses to stop.
///
/// Clones observe the same flag. Analyses poll it between group computations
/// and return `AnalyticsError::Cancelled` instead of a partial result.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// True if a token was supplied and has been cancelled.
pub(crate) fn cancelled(token: Option<&CancelToken>) -> bool {
    token.is_some_and(CancelToken::is_cancelled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!cancelled(Some(&token)));

        clone.cancel();
        assert!(token.is_cancelled());
        assert!(cancelled(Some(&token)));
        assert!(!cancelled(None));
    }
}
