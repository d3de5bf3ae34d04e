//! Guarded invocation of operator-supplied extensions.
//!
//! Extensions (content overrides, hooks, extra-field resolvers, result
//! formatters) must never crash the pipeline. [`guard`] runs one and turns an
//! error or a panic into `None`, so callers fall back to their default path.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::warn;

/// Error type returned by extensions.
pub type ExtensionError = Box<dyn std::error::Error + Send + Sync>;

/// Result type returned by extensions.
pub type ExtensionResult<T> = Result<T, ExtensionError>;

/// Run an extension, returning `None` if it fails or panics.
///
/// # Example
///
/// ```
/// use content_indexer_shared::guard;
///
/// let value = guard("double", || Ok(21 * 2));
/// assert_eq!(value, Some(42));
///
/// let failed: Option<u32> = guard("broken", || Err("nope".into()));
/// assert!(failed.is_none());
/// ```
pub fn guard<T>(extension: &str, f: impl FnOnce() -> ExtensionResult<T>) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Some(value),
        Ok(Err(error)) => {
            warn!(extension = %extension, error = %error, "Extension failed, using default");
            None
        }
        Err(payload) => {
            warn!(
                extension = %extension,
                panic = %panic_message(payload.as_ref()),
                "Extension panicked, using default"
            );
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_passes_value_through() {
        assert_eq!(guard("ok", || Ok("value")), Some("value"));
    }

    #[test]
    fn test_guard_swallows_error() {
        let result: Option<()> = guard("err", || Err("resolver exploded".into()));
        assert!(result.is_none());
    }

    #[test]
    fn test_guard_swallows_panic() {
        let result: Option<u8> = guard("panics", || panic!("boom"));
        assert!(result.is_none());
    }
}
