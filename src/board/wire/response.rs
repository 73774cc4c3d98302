//! Status and JSON body returned for a reorder request.

use super::body::{ReorderRoute, WireError};
use crate::board::ports::BoardRepository;
use crate::board::services::{ReorderError, ReorderErrorKind, ReorderService};
use mockable::Clock;
use serde_json::{Value, json};
use tracing::warn;

/// Status returned when the reorder committed or was a no-op.
pub const STATUS_OK: u16 = 200;
/// Status returned for malformed bodies and out-of-range indices.
pub const STATUS_BAD_REQUEST: u16 = 400;
/// Status returned when the scope or item does not exist.
pub const STATUS_NOT_FOUND: u16 = 404;
/// Status returned when the transaction failed and rolled back.
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// Transport-neutral response to a reorder request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireResponse {
    /// HTTP-style status code.
    pub status: u16,
    /// JSON body: `{"success": true}` or `{"error": "..."}`.
    pub body: Value,
}

impl WireResponse {
    /// Successful response.
    #[must_use]
    pub fn success() -> Self {
        Self {
            status: STATUS_OK,
            body: json!({ "success": true }),
        }
    }

    /// Error response with the given status.
    #[must_use]
    pub fn failure(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }

    /// Returns `true` for a 2xx status.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Returns the error message of a failure response.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.body.get("error").and_then(Value::as_str)
    }
}

impl From<&WireError> for WireResponse {
    fn from(err: &WireError) -> Self {
        Self::failure(STATUS_BAD_REQUEST, err.to_string())
    }
}

impl From<&ReorderError> for WireResponse {
    fn from(err: &ReorderError) -> Self {
        match err.kind() {
            ReorderErrorKind::NotFound => Self::failure(STATUS_NOT_FOUND, err.to_string()),
            ReorderErrorKind::InvalidIndex => Self::failure(STATUS_BAD_REQUEST, err.to_string()),
            ReorderErrorKind::TransactionFailure => {
                Self::failure(STATUS_INTERNAL_ERROR, "failed to reorder")
            }
        }
    }
}

/// Decodes `body` for `route`, runs the reorder, and maps the result to a
/// response.
pub async fn respond<R, C>(
    service: &ReorderService<R, C>,
    route: ReorderRoute,
    body: &str,
) -> WireResponse
where
    R: BoardRepository,
    C: Clock + Send + Sync,
{
    let request = match route.decode(body) {
        Ok(request) => request,
        Err(err) => {
            warn!(path = %route.path(), error = %err, "rejected reorder body");
            return WireResponse::from(&err);
        }
    };

    match service.handle(request).await {
        Ok(_) => WireResponse::success(),
        Err(err) => WireResponse::from(&err),
    }
}
