//! Resource client trait definition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use inboxdrive_common::{ItemId, MimeCategory, Result};

/// Profile of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Display name.
    pub name: String,
    /// Primary mail address, falling back to the principal name.
    pub email: String,
}

/// One entry in a folder listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingItem {
    /// Item identifier assigned by the remote API.
    pub id: ItemId,
    /// Display name of the file or folder.
    pub name: String,
    /// Coarse content category.
    pub category: MimeCategory,
    /// Short-lived direct download URL, when the API provides one.
    pub download_url: Option<String>,
}

impl ListingItem {
    /// Check if this item is a folder.
    pub fn is_folder(&self) -> bool {
        self.category == MimeCategory::Folder
    }
}

/// Drive storage quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageQuota {
    /// Bytes in use.
    pub used: u64,
    /// Total capacity in bytes.
    pub total: u64,
}

impl StorageQuota {
    /// Fraction of the quota in use, in percent.
    ///
    /// A zero-capacity drive reports 0 rather than dividing by zero.
    pub fn percent_used(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.used as f64 / self.total as f64 * 100.0
        }
    }
}

/// Summary of a received mail message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSummary {
    /// Message identifier.
    pub id: String,
    /// Subject line, absent for subjectless mail.
    pub subject: Option<String>,
    /// Sender address, absent when the API omits the sender.
    pub sender: Option<String>,
    /// When the message was received.
    pub received_at: DateTime<Utc>,
}

/// Authenticated access to the remote productivity API.
///
/// Every call acquires its token silently from the injected credential
/// provider; callers never handle tokens themselves.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Fetch the signed-in user's profile.
    async fn profile(&self) -> Result<Profile>;

    /// List the children of a folder, or of the drive root when `folder`
    /// is `None`.
    ///
    /// # Postconditions
    /// - Returns the complete fresh listing; callers replace their view
    ///   wholesale, never merge
    async fn list_children(&self, folder: Option<&ItemId>) -> Result<Vec<ListingItem>>;

    /// Fetch the drive storage quota.
    async fn quota(&self) -> Result<StorageQuota>;

    /// Fetch the most recently received messages, newest first.
    async fn recent_messages(&self, top: usize) -> Result<Vec<MessageSummary>>;

    /// Upload file content into a folder (drive root when `folder` is
    /// `None`), using the file's declared name and content type.
    ///
    /// # Postconditions
    /// - Returns the listing entry of the newly created item
    ///
    /// # Errors
    /// - Upload rejected or interrupted; the target folder is unchanged
    async fn upload(
        &self,
        folder: Option<&ItemId>,
        name: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<ListingItem>;
}
