//! Common types used throughout InboxDrive.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a drive item (file or folder) as assigned by the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(String);

impl ItemId {
    /// Create a new ItemId from a string.
    ///
    /// # Preconditions
    /// - `id` must be non-empty
    ///
    /// # Errors
    /// - Returns error if id is empty
    pub fn new(id: impl Into<String>) -> crate::Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(crate::Error::InvalidInput(
                "ItemId cannot be empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse content category of a drive item.
///
/// Derived from the item's folder facet or MIME type prefix; everything
/// that is neither a folder, an image, nor a video falls into `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MimeCategory {
    /// The item is a folder.
    Folder,
    /// MIME type starts with "image".
    Image,
    /// MIME type starts with "video".
    Video,
    /// Any other (or unknown) content type.
    Other,
}

impl MimeCategory {
    /// Categorize a file by its MIME type, if known.
    pub fn from_mime(mime: Option<&str>) -> Self {
        match mime {
            Some(m) if m.starts_with("image") => Self::Image,
            Some(m) if m.starts_with("video") => Self::Video,
            _ => Self::Other,
        }
    }
}
