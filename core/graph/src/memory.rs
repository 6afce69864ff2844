//! In-memory resource client for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use uuid::Uuid;

use inboxdrive_common::{Error, ItemId, MimeCategory, Result};

use crate::service::{ListingItem, MessageSummary, Profile, ResourceClient, StorageQuota};

/// Key under which root children are stored.
const ROOT_KEY: &str = "root";

/// Operations of the resource client, for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    Profile,
    Listing,
    Quota,
    Messages,
    Upload,
}

struct Inner {
    profile: Profile,
    quota: StorageQuota,
    messages: Vec<MessageSummary>,
    children: HashMap<String, Vec<ListingItem>>,
    failing: HashSet<Call>,
    listing_fetches: usize,
}

/// In-memory resource client.
///
/// Useful for testing and development. Holds a small folder tree, a
/// profile, a quota, and a mailbox; individual operations can be made to
/// fail on demand, and listing fetches are counted so tests can assert on
/// re-fetch behavior.
pub struct MemoryResourceClient {
    inner: RwLock<Inner>,
}

impl MemoryResourceClient {
    /// Create a client with an empty root folder and placeholder profile.
    pub fn new() -> Self {
        let mut children = HashMap::new();
        children.insert(ROOT_KEY.to_string(), Vec::new());

        Self {
            inner: RwLock::new(Inner {
                profile: Profile {
                    name: "Memory User".to_string(),
                    email: "memory@example.com".to_string(),
                },
                quota: StorageQuota { used: 0, total: 0 },
                messages: Vec::new(),
                children,
                failing: HashSet::new(),
                listing_fetches: 0,
            }),
        }
    }

    fn key(folder: Option<&ItemId>) -> String {
        folder
            .map(|id| id.as_str().to_string())
            .unwrap_or_else(|| ROOT_KEY.to_string())
    }

    /// Replace the stored profile.
    pub fn set_profile(&self, profile: Profile) {
        self.inner.write().unwrap().profile = profile;
    }

    /// Replace the stored quota.
    pub fn set_quota(&self, quota: StorageQuota) {
        self.inner.write().unwrap().quota = quota;
    }

    /// Replace the stored mailbox.
    pub fn set_messages(&self, messages: Vec<MessageSummary>) {
        self.inner.write().unwrap().messages = messages;
    }

    /// Set the children of a folder (root when `folder` is `None`).
    pub fn insert_children(&self, folder: Option<&ItemId>, items: Vec<ListingItem>) {
        self.inner
            .write()
            .unwrap()
            .children
            .insert(Self::key(folder), items);
    }

    /// Make one operation fail (or succeed again).
    pub fn set_failing(&self, call: Call, failing: bool) {
        let mut inner = self.inner.write().unwrap();
        if failing {
            inner.failing.insert(call);
        } else {
            inner.failing.remove(&call);
        }
    }

    /// Number of listing fetches served (including failed ones).
    pub fn listing_fetches(&self) -> usize {
        self.inner.read().unwrap().listing_fetches
    }

    /// Convenience constructor for a folder listing entry.
    pub fn folder_item(id: &str, name: &str) -> ListingItem {
        ListingItem {
            id: ItemId::new(id).expect("folder id must be non-empty"),
            name: name.to_string(),
            category: MimeCategory::Folder,
            download_url: None,
        }
    }

    /// Convenience constructor for a file listing entry.
    pub fn file_item(id: &str, name: &str, mime: &str) -> ListingItem {
        ListingItem {
            id: ItemId::new(id).expect("file id must be non-empty"),
            name: name.to_string(),
            category: MimeCategory::from_mime(Some(mime)),
            download_url: None,
        }
    }

    fn check(&self, inner: &Inner, call: Call) -> Result<()> {
        if inner.failing.contains(&call) {
            return Err(Error::Network(format!("Injected {:?} failure", call)));
        }
        Ok(())
    }
}

impl Default for MemoryResourceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceClient for MemoryResourceClient {
    async fn profile(&self) -> Result<Profile> {
        let inner = self.inner.read().unwrap();
        self.check(&inner, Call::Profile)?;
        Ok(inner.profile.clone())
    }

    async fn list_children(&self, folder: Option<&ItemId>) -> Result<Vec<ListingItem>> {
        let mut inner = self.inner.write().unwrap();
        inner.listing_fetches += 1;
        self.check(&inner, Call::Listing)?;

        let key = Self::key(folder);
        inner
            .children
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("No folder with id {}", key)))
    }

    async fn quota(&self) -> Result<StorageQuota> {
        let inner = self.inner.read().unwrap();
        self.check(&inner, Call::Quota)?;
        Ok(inner.quota)
    }

    async fn recent_messages(&self, top: usize) -> Result<Vec<MessageSummary>> {
        let inner = self.inner.read().unwrap();
        self.check(&inner, Call::Messages)?;
        Ok(inner.messages.iter().take(top).cloned().collect())
    }

    async fn upload(
        &self,
        folder: Option<&ItemId>,
        name: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<ListingItem> {
        let mut inner = self.inner.write().unwrap();
        if inner.failing.contains(&Call::Upload) {
            return Err(Error::Upload("Injected upload failure".to_string()));
        }

        let key = Self::key(folder);
        let item = ListingItem {
            id: ItemId::new(Uuid::new_v4().to_string()).expect("uuid is non-empty"),
            name: name.to_string(),
            category: MimeCategory::from_mime(Some(content_type)),
            download_url: None,
        };

        let entry = inner
            .children
            .get_mut(&key)
            .ok_or_else(|| Error::NotFound(format!("No folder with id {}", key)))?;
        entry.push(item.clone());
        inner.quota.used += data.len() as u64;

        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_root_starts_empty() {
        let client = MemoryResourceClient::new();
        assert!(client.list_children(None).await.unwrap().is_empty());
        assert_eq!(client.listing_fetches(), 1);
    }

    #[tokio::test]
    async fn test_children_of_known_folder() {
        let client = MemoryResourceClient::new();
        let folder = ItemId::new("A").unwrap();
        client.insert_children(
            Some(&folder),
            vec![MemoryResourceClient::file_item("F1", "photo.png", "image/png")],
        );

        let items = client.list_children(Some(&folder)).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].category, MimeCategory::Image);
    }

    #[tokio::test]
    async fn test_unknown_folder_is_not_found() {
        let client = MemoryResourceClient::new();
        let folder = ItemId::new("missing").unwrap();

        assert!(matches!(
            client.list_children(Some(&folder)).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let client = MemoryResourceClient::new();
        client.set_failing(Call::Quota, true);

        assert!(client.quota().await.is_err());

        client.set_failing(Call::Quota, false);
        assert!(client.quota().await.is_ok());
    }

    #[tokio::test]
    async fn test_upload_appends_to_folder() {
        let client = MemoryResourceClient::new();
        let item = client
            .upload(None, "notes.txt", "text/plain", b"hello".to_vec())
            .await
            .unwrap();

        assert_eq!(item.name, "notes.txt");
        let listing = client.list_children(None).await.unwrap();
        assert_eq!(listing.len(), 1);
        assert_eq!(client.quota().await.unwrap().used, 5);
    }

    #[tokio::test]
    async fn test_recent_messages_honors_top() {
        let client = MemoryResourceClient::new();
        let messages: Vec<MessageSummary> = (0..5)
            .map(|i| MessageSummary {
                id: format!("MSG{}", i),
                subject: None,
                sender: None,
                received_at: chrono::Utc::now(),
            })
            .collect();
        client.set_messages(messages);

        assert_eq!(client.recent_messages(3).await.unwrap().len(), 3);
    }
}
