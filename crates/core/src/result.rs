//! Result type definition and extension traits for Railway-Oriented Programming.
//!
//! Provides functional combinators for Result types, enabling clean error handling
//! without unwrap/expect/panic.

use crate::error::Error;

/// The standard Result type for kiln core operations.
///
/// # Examples
///
/// ```ignore
/// fn operation() -> Result<ReconcilerConfig> {
///     let config: ReconcilerConfig = read_document(path)?;
///     Ok(config)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Generic extension trait for any Result type (not just `kiln_core::Result`).
///
/// Provides tap-style combinators for side effects such as logging.
pub trait GenericResultExt<T, E> {
    /// Perform a side effect on Ok value without consuming the Result.
    fn tap_ok<F: FnOnce(&T)>(self, f: F) -> Self;

    /// Perform a side effect on Err value without consuming the Result.
    fn tap_err<F: FnOnce(&E)>(self, f: F) -> Self;
}

impl<T, E> GenericResultExt<T, E> for std::result::Result<T, E> {
    fn tap_ok<F: FnOnce(&T)>(self, f: F) -> Self {
        if let Ok(ref v) = self {
            f(v);
        }
        self
    }

    fn tap_err<F: FnOnce(&E)>(self, f: F) -> Self {
        if let Err(ref e) = self {
            f(e);
        }
        self
    }
}

/// Extension trait for Option types providing Railway-style operations.
pub trait OptionExt<T> {
    /// Treat empty-like values as absent.
    fn filter_blank(self) -> Self;
}

impl OptionExt<String> for Option<String> {
    fn filter_blank(self) -> Self {
        self.filter(|s| !s.trim().is_empty())
    }
}
