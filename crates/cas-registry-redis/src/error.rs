//! Redis error conversion.

use cas_registry::RegistryError;

/// Converts a `fred` Redis error to a `RegistryError`.
#[allow(clippy::needless_pass_by_value)]
pub fn from_redis_error(err: fred::error::Error) -> RegistryError {
    match err.kind() {
        fred::error::ErrorKind::IO => RegistryError::Backend(err.to_string()),
        fred::error::ErrorKind::Timeout => RegistryError::Timeout,
        _ => RegistryError::Backend(err.to_string()),
    }
}

/// Converts a serialization error to a `RegistryError`.
#[allow(clippy::needless_pass_by_value)]
pub fn from_serde_error(err: serde_json::Error) -> RegistryError {
    RegistryError::Serialization(err.to_string())
}
