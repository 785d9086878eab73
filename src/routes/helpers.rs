//! Shared helper functions for Rocket route handlers.

use uuid::Uuid;

use crate::error::ApiError;

/// Parse an identifier taken from the request path.
///
/// A malformed id can never name an existing record, so it is reported as
/// [`ApiError::NotFound`] for `entity`.
pub fn parse_path_id(raw: &str, entity: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(format!("{entity} not found")))
}
