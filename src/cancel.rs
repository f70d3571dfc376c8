//! Cooperative cancellation
//!
//! A `CancellationToken` is owned by the caller (typically one per keystroke or
//! per screen) and only referenced by the relay. The relay checks it before
//! dispatch and before every attempt, and races it against in-flight waits.

use crate::error::ApiError;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken as SignalToken;

type CancelObserver = Box<dyn FnOnce() + Send>;

/// Caller-owned "result no longer wanted" signal. Clones share state.
#[derive(Clone)]
pub struct CancellationToken {
    signal: SignalToken,
    /// `None` once the observers have been fired.
    observers: Arc<Mutex<Option<Vec<CancelObserver>>>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self {
            signal: SignalToken::new(),
            observers: Arc::new(Mutex::new(Some(Vec::new()))),
        }
    }

    /// Request cancellation. Observers run once, on the first call only.
    pub fn cancel(&self) {
        self.signal.cancel();

        let observers = self.observers.lock().take();
        for observer in observers.into_iter().flatten() {
            observer();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.signal.is_cancelled()
    }

    /// Register an observer. Runs immediately if the observers already fired.
    ///
    /// Observers run on the cancelling thread, so they must not block.
    pub fn on_cancel<F>(&self, observer: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut observers = self.observers.lock();
            if let Some(ref mut pending) = *observers {
                pending.push(Box::new(observer));
                return;
            }
        }
        observer();
    }

    /// Resolves once cancellation has been requested.
    pub async fn cancelled(&self) {
        self.signal.cancelled().await
    }

    /// `Err(ApiError::Cancelled)` once cancellation has been requested.
    pub fn check(&self) -> Result<(), ApiError> {
        if self.is_cancelled() {
            Err(ApiError::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
