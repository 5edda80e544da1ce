pub mod application;
pub mod job;
pub mod user;

use uuid::Uuid;

use crate::errors::AppError;

/// Parses an identifier received from a caller.
///
/// Identifiers leave the service as hyphenated lowercase strings, so anything
/// we hand out parses back to the same value.
pub fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::InvalidIdentifier(raw.to_string()))
}

/// Like [`parse_id`] for optional query parameters; blank values count as absent.
pub fn parse_optional_id(raw: Option<&str>) -> Result<Option<Uuid>, AppError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_id(value).map(Some),
    }
}
