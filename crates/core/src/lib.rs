//! Core types, errors, and utilities shared across the kiln workspace.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod document;
pub mod error;
pub mod result;

pub use document::{DocumentFormat, parse_document, read_document, render_document};
pub use error::Error;
pub use result::{GenericResultExt, OptionExt, Result};
