//! Queue consumer implementations.

pub mod thumbnail;
pub mod welcome_email;

pub use thumbnail::ThumbnailJobHandler;
pub use welcome_email::WelcomeEmailJobHandler;

use std::str::FromStr;

use crate::error::JobError;

/// Parse a payload id field into its typed form.
pub(crate) fn parse_id<T: FromStr>(field: &'static str, value: &str) -> Result<T, JobError> {
    value.parse().map_err(|_| JobError::InvalidId {
        field,
        value: value.to_string(),
    })
}
