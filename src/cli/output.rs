//! CLI output: error mapping from relay errors to a stable CLI surface.

use crate::error::ApiError;

/// Map relay errors to a string for CLI output. Cancellation prints nothing.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::Cancelled => String::new(),
        ApiError::Status { status: 429, .. } => {
            format!("{} (rate limited; try again shortly)", e)
        }
        other => other.to_string(),
    }
}

/// Process exit code for a failed command.
pub fn exit_code(e: &ApiError) -> i32 {
    match e {
        ApiError::Cancelled => 130,
        ApiError::Config(_) => 2,
        _ => 1,
    }
}
