//! Sequential Request Queue
//!
//! Process-wide single-flight queue in front of the upstream API. Calls are
//! dispatched in strict enqueue order, one at a time, each spaced by the
//! [`Pacer`]. Every enqueued call resolves its own [`PendingCall`] exactly once,
//! independent of its position in the queue, and one call's failure never
//! blocks the calls behind it.

use crate::cancel::CancellationToken;
use crate::error::ApiError;
use crate::pacer::Pacer;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

/// Enqueue-order identity of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CallId(u64);

impl CallId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "call-{}", self.0)
    }
}

/// Queue statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Calls waiting for dispatch
    pub pending: usize,
    /// Calls removed from the queue whose handle has not settled yet
    pub in_flight: usize,
    /// Calls resolved with a value
    pub completed: usize,
    /// Calls resolved with an error other than cancellation
    pub failed: usize,
    /// Calls resolved as cancelled (at the head of the queue or in flight)
    pub cancelled: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallOutcome {
    Completed,
    Failed,
    Cancelled,
}

impl CallOutcome {
    fn of<T>(result: &Result<T, ApiError>) -> Self {
        match result {
            Ok(_) => CallOutcome::Completed,
            Err(e) if e.is_cancelled() => CallOutcome::Cancelled,
            Err(_) => CallOutcome::Failed,
        }
    }
}

/// Runs once with the call's outcome, before the caller's handle is resolved.
type SettleHook = Box<dyn FnOnce(CallOutcome) + Send>;

/// Type-erased queued call: the thunk plus the sender bound to the caller's handle.
trait QueuedCall: Send {
    fn id(&self) -> CallId;

    fn is_cancelled(&self) -> bool;

    /// Run the thunk, report the outcome to `on_settle`, then resolve the handle.
    fn dispatch(self: Box<Self>, on_settle: SettleHook) -> BoxFuture<'static, CallOutcome>;

    /// Settle the handle without running the thunk.
    fn reject(self: Box<Self>, error: ApiError);
}

struct TypedCall<T, F> {
    id: CallId,
    cancel: Option<CancellationToken>,
    call: F,
    completion_tx: oneshot::Sender<Result<T, ApiError>>,
}

impl<T, F, Fut> QueuedCall for TypedCall<T, F>
where
    T: Send + 'static,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
{
    fn id(&self) -> CallId {
        self.id
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }

    fn dispatch(self: Box<Self>, on_settle: SettleHook) -> BoxFuture<'static, CallOutcome> {
        let TypedCall {
            id,
            call,
            completion_tx,
            ..
        } = *self;

        async move {
            let result = AssertUnwindSafe(async move { call().await })
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    Err(ApiError::Internal(format!("{} panicked while running", id)))
                });
            let outcome = CallOutcome::of(&result);
            on_settle(outcome);
            // The caller may have dropped its handle; nothing to deliver then.
            let _ = completion_tx.send(result);
            outcome
        }
        .boxed()
    }

    fn reject(self: Box<Self>, error: ApiError) {
        let _ = self.completion_tx.send(Err(error));
    }
}

/// Handle to a call's eventual result. Settles exactly once.
#[derive(Debug)]
pub struct PendingCall<T> {
    id: CallId,
    rx: oneshot::Receiver<Result<T, ApiError>>,
}

impl<T> PendingCall<T> {
    pub fn id(&self) -> CallId {
        self.id
    }
}

impl<T> Future for PendingCall<T> {
    type Output = Result<T, ApiError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(ApiError::QueueClosed)))
    }
}

struct QueueState {
    /// Insertion order is dispatch order.
    pending: VecDeque<Box<dyn QueuedCall>>,
    /// Set while a drain task owns dispatching; only one drain loop runs at a time.
    draining: bool,
    pacer: Pacer,
    stats: QueueStats,
    next_id: u64,
}

impl QueueState {
    fn allocate_id(&mut self) -> CallId {
        let id = CallId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Resolve cancelled calls sitting at the head so they never take a pacing slot.
    fn reject_cancelled_head(&mut self) {
        while self.pending.front().is_some_and(|call| call.is_cancelled()) {
            if let Some(call) = self.pending.pop_front() {
                debug!(call_id = %call.id(), "Dropping cancelled call before dispatch");
                self.stats.pending = self.stats.pending.saturating_sub(1);
                self.stats.cancelled += 1;
                call.reject(ApiError::Cancelled);
            }
        }
    }

    /// Remove a still-waiting call. `None` once it has been dispatched or settled.
    fn withdraw(&mut self, id: CallId) -> Option<Box<dyn QueuedCall>> {
        let position = self.pending.iter().position(|call| call.id() == id)?;
        let call = self.pending.remove(position)?;
        self.stats.pending = self.stats.pending.saturating_sub(1);
        self.stats.cancelled += 1;
        Some(call)
    }

    /// Either the wait before the head may dispatch, or `None` after releasing
    /// the draining flag because there is nothing left to do.
    fn next_wait(&mut self, now: Instant) -> Option<Duration> {
        self.reject_cancelled_head();
        if self.pending.is_empty() {
            self.draining = false;
            return None;
        }
        Some(self.pacer.time_until_next_slot(now))
    }

    fn take_head(&mut self, now: Instant) -> Option<Box<dyn QueuedCall>> {
        self.reject_cancelled_head();
        let Some(call) = self.pending.pop_front() else {
            self.draining = false;
            return None;
        };
        self.pacer.record_dispatch(now);
        self.stats.pending = self.stats.pending.saturating_sub(1);
        self.stats.in_flight += 1;
        Some(call)
    }

    fn settle(&mut self, outcome: CallOutcome) {
        self.stats.in_flight = self.stats.in_flight.saturating_sub(1);
        match outcome {
            CallOutcome::Completed => self.stats.completed += 1,
            CallOutcome::Failed => self.stats.failed += 1,
            CallOutcome::Cancelled => self.stats.cancelled += 1,
        }
    }
}

/// Releases the queue if the drain task is dropped before it finishes,
/// e.g. when its runtime shuts down. Waiting calls resolve `QueueClosed`
/// and the next enqueue starts a fresh drain loop.
struct DrainGuard {
    state: Arc<Mutex<QueueState>>,
    /// Set when the loop exits normally, after clearing `draining` itself.
    released: bool,
}

impl Drop for DrainGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        let orphaned: Vec<Box<dyn QueuedCall>> = {
            let mut state = self.state.lock();
            state.draining = false;
            // The in-flight call was dropped with the task; its handle sees a closed channel.
            let lost = state.stats.in_flight + state.pending.len();
            state.stats.failed += lost;
            state.stats.in_flight = 0;
            state.stats.pending = 0;
            state.pending.drain(..).collect()
        };

        warn!(
            orphaned = orphaned.len(),
            "Drain loop stopped early, closing waiting calls"
        );
        for call in orphaned {
            call.reject(ApiError::QueueClosed);
        }
    }
}

/// Single-flight FIFO queue. Clones share the same state, so one instance
/// paces every caller in the process.
#[derive(Clone)]
pub struct RequestQueue {
    state: Arc<Mutex<QueueState>>,
}

impl RequestQueue {
    pub fn new(pacer: Pacer) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState {
                pending: VecDeque::new(),
                draining: false,
                pacer,
                stats: QueueStats::default(),
                next_id: 1,
            })),
        }
    }

    pub fn with_min_interval(min_interval: Duration) -> Self {
        Self::new(Pacer::new(min_interval))
    }

    /// Append a call and return its handle immediately.
    ///
    /// `cancel` lets the queue drop the call without dispatching it if the
    /// caller gives up while it is still waiting; the handle then resolves
    /// `Cancelled` at once. The drain task is spawned on the current tokio
    /// runtime. Outside a runtime nothing is queued and the handle resolves
    /// `QueueClosed`.
    pub fn enqueue<T, F, Fut>(&self, call: F, cancel: Option<CancellationToken>) -> PendingCall<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let (completion_tx, rx) = oneshot::channel();

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                let id = self.state.lock().allocate_id();
                warn!(call_id = %id, error = %e, "Enqueue outside a tokio runtime");
                let _ = completion_tx.send(Err(ApiError::QueueClosed));
                return PendingCall { id, rx };
            }
        };

        let (id, start_drain) = {
            let mut state = self.state.lock();
            let id = state.allocate_id();
            state.pending.push_back(Box::new(TypedCall {
                id,
                cancel: cancel.clone(),
                call,
                completion_tx,
            }));
            state.stats.pending += 1;

            debug!(
                call_id = %id,
                queue_depth = state.pending.len(),
                draining = state.draining,
                "Enqueued call"
            );

            let start_drain = !state.draining;
            state.draining = true;
            (id, start_drain)
        };

        // Registered outside the lock: the observer runs inline if the token
        // is already cancelled.
        if let Some(token) = cancel {
            let weak = Arc::downgrade(&self.state);
            token.on_cancel(move || {
                let Some(state) = weak.upgrade() else {
                    return;
                };
                let removed = state.lock().withdraw(id);
                if let Some(call) = removed {
                    debug!(call_id = %id, "Withdrew cancelled call while waiting");
                    call.reject(ApiError::Cancelled);
                }
            });
        }

        if start_drain {
            runtime.spawn(Self::drain(Arc::clone(&self.state)));
        }

        PendingCall { id, rx }
    }

    /// Dispatch loop. Exactly one runs while `draining` is set; it clears the
    /// flag itself, under the lock, once it observes an empty queue.
    async fn drain(state: Arc<Mutex<QueueState>>) {
        debug!("Drain loop started");
        let mut guard = DrainGuard {
            state: Arc::clone(&state),
            released: false,
        };

        loop {
            let next_wait = state.lock().next_wait(Instant::now());
            let Some(wait) = next_wait else {
                guard.released = true;
                break;
            };

            if !wait.is_zero() {
                debug!(wait_ms = wait.as_millis() as u64, "Pacing before next dispatch");
                sleep(wait).await;
            }

            let head = state.lock().take_head(Instant::now());
            let Some(call) = head else {
                guard.released = true;
                break;
            };

            let call_id = call.id();
            debug!(call_id = %call_id, "Dispatching call");

            let settle_state = Arc::clone(&state);
            let on_settle: SettleHook = Box::new(move |outcome| {
                settle_state.lock().settle(outcome);
            });

            match call.dispatch(on_settle).await {
                CallOutcome::Completed => debug!(call_id = %call_id, "Call completed"),
                CallOutcome::Cancelled => info!(call_id = %call_id, "Call cancelled"),
                CallOutcome::Failed => warn!(call_id = %call_id, "Call failed"),
            }
        }

        debug!("Drain loop idle");
    }

    /// Get queue statistics
    pub fn stats(&self) -> QueueStats {
        self.state.lock().stats.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when nothing is queued and no drain loop is running.
    pub fn is_idle(&self) -> bool {
        let state = self.state.lock();
        !state.draining && state.pending.is_empty()
    }

    pub fn min_interval(&self) -> Duration {
        self.state.lock().pacer.min_interval()
    }

    pub fn last_dispatch(&self) -> Option<Instant> {
        self.state.lock().pacer.last_dispatch()
    }
}

impl Default for RequestQueue {
    fn default() -> Self {
        Self::new(Pacer::default())
    }
}

impl fmt::Debug for RequestQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("RequestQueue")
            .field("pending", &state.pending.len())
            .field("draining", &state.draining)
            .field("stats", &state.stats)
            .finish()
    }
}
