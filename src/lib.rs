//! Jikan Relay: paced, single-flight request orchestration for the Jikan anime API
//!
//! Every outbound call goes through one process-wide FIFO queue that keeps a
//! minimum interval between dispatches, retries rate-limit rejections with a
//! fixed backoff, and honours caller-owned cancellation tokens.

pub mod api;
pub mod cancel;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod pacer;
pub mod queue;
pub mod retry;
pub mod session;
pub mod transport;
pub mod types;

pub use api::JikanClient;
pub use cancel::CancellationToken;
pub use error::ApiError;
