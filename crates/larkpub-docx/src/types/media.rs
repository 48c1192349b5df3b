//! Drive media types.

use std::fmt;

/// Token of an uploaded media file.
///
/// Returned by `upload_media` and consumed by `bind_image`, so a token is
/// bound at most once.
#[derive(Debug, PartialEq, Eq)]
pub struct FileToken(String);

impl FileToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
