//! UUID utilities

use uuid::Uuid;

use crate::{Error, Result};

/// Generate a new UUIDv4
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// Parse UUID from string
pub fn parse(s: &str) -> std::result::Result<Uuid, uuid::Error> {
    Uuid::parse_str(s)
}

/// Parse a UUID read from a TEXT column, naming the column on failure
pub fn parse_column(column: &str, value: &str) -> Result<Uuid> {
    parse(value).map_err(|e| Error::Internal(format!("Invalid UUID in {}: {} ({})", column, value, e)))
}

/// Parse an optional UUID column; NULL stays `None`
pub fn parse_optional_column(column: &str, value: Option<&str>) -> Result<Option<Uuid>> {
    value.map(|v| parse_column(column, v)).transpose()
}

/// Treat `None` and the nil UUID alike as "identifier not supplied"
pub fn present(id: Option<Uuid>) -> Option<Uuid> {
    id.filter(|id| !id.is_nil())
}
