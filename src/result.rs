//! Result type used throughout updatebot.
//!
//! Every fallible function returns [`Result<T>`], an alias for
//! `color_eyre::eyre::Result<T>`. Context is attached with `.wrap_err()` as
//! errors propagate so that a failure deep inside one repository reports
//! which rule, repository and change it came from.
//!
//! Typed failures that callers need to recognise are defined in
//! [`crate::error::UpdatebotError`] and travel inside the report; they can be
//! recovered with `report.downcast_ref::<UpdatebotError>()`.
//!
//! ```rust,ignore
//! use color_eyre::eyre::WrapErr;
//! use crate::result::Result;
//!
//! fn load(path: &Path) -> Result<String> {
//!     let content = std::fs::read_to_string(path)
//!         .wrap_err_with(|| format!("failed to read {}", path.display()))?;
//!     Ok(content)
//! }
//! ```

use color_eyre::eyre::Result as EyreResult;

/// Standard result type used throughout updatebot.
pub type Result<T> = EyreResult<T>;
