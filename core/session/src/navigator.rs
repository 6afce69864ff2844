//! Folder navigation over the drive hierarchy.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use inboxdrive_common::{ItemId, Result};
use inboxdrive_graph::ResourceClient;

use crate::state::{Notice, SharedState};

/// Navigator over the drive folder hierarchy.
///
/// Maintains the path from the root to the currently viewed folder and
/// replaces the shared listing wholesale on every navigation; there is no
/// merging and no identity preservation across fetches. Every listing
/// fetch is tagged with a generation so a slow response can never
/// overwrite a newer one.
pub struct DriveNavigator {
    client: Arc<dyn ResourceClient>,
    state: SharedState,
    stack: RwLock<Vec<ItemId>>,
    generation: AtomicU64,
}

impl DriveNavigator {
    pub(crate) fn new(client: Arc<dyn ResourceClient>, state: SharedState) -> Self {
        Self {
            client,
            state,
            stack: RwLock::new(Vec::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Folder whose children are currently displayed (`None` = root).
    pub async fn current_folder(&self) -> Option<ItemId> {
        self.stack.read().await.last().cloned()
    }

    /// Current navigation depth (0 = root).
    pub async fn depth(&self) -> usize {
        self.stack.read().await.len()
    }

    /// The navigation path from the root to the current folder.
    pub async fn path(&self) -> Vec<ItemId> {
        self.stack.read().await.clone()
    }

    /// Descend into a folder and display its children.
    pub async fn open_folder(&self, id: ItemId) -> Result<()> {
        self.stack.write().await.push(id.clone());
        self.fetch_listing(Some(id)).await
    }

    /// Go back up one level and display the parent's children.
    ///
    /// Popping an empty stack degrades safely: the navigator stays at the
    /// root and the root children are fetched again.
    pub async fn go_back(&self) -> Result<()> {
        let current = {
            let mut stack = self.stack.write().await;
            stack.pop();
            stack.last().cloned()
        };
        self.fetch_listing(current).await
    }

    /// Re-fetch the currently viewed folder.
    pub async fn refresh(&self) -> Result<()> {
        let current = self.current_folder().await;
        self.fetch_listing(current).await
    }

    /// Upload file content into the currently viewed folder.
    ///
    /// # Postconditions
    /// - On success, a success notice is recorded and the folder that was
    ///   uploaded into is re-fetched exactly once
    /// - On failure, a failure notice is recorded and the listing is left
    ///   unchanged
    pub async fn upload(&self, name: &str, content_type: &str, data: Vec<u8>) -> Result<()> {
        let target = self.current_folder().await;

        match self
            .client
            .upload(target.as_ref(), name, content_type, data)
            .await
        {
            Ok(item) => {
                debug!("Uploaded {} as {}", name, item.id);
                self.state.write().await.notice =
                    Some(Notice::success(format!("Uploaded {}", name)));
                self.fetch_listing(target).await
            }
            Err(e) => {
                warn!("Upload of {} failed: {}", name, e);
                self.state.write().await.notice =
                    Some(Notice::error(format!("Upload of {} failed", name)));
                Err(e)
            }
        }
    }

    /// Fetch children of `folder` and replace the shared listing, unless a
    /// newer fetch was issued while this one was in flight.
    async fn fetch_listing(&self, folder: Option<ItemId>) -> Result<()> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let items = self.client.list_children(folder.as_ref()).await?;

        if self.generation.load(Ordering::SeqCst) == generation {
            self.state.write().await.listing = items;
        } else {
            debug!("Discarding stale listing response");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SessionState;
    use inboxdrive_graph::MemoryResourceClient;
    use proptest::prelude::*;

    fn folder_id(id: &str) -> ItemId {
        ItemId::new(id).unwrap()
    }

    fn seeded_client() -> Arc<MemoryResourceClient> {
        let client = Arc::new(MemoryResourceClient::new());
        client.insert_children(
            None,
            vec![
                MemoryResourceClient::folder_item("A", "Projects"),
                MemoryResourceClient::file_item("F1", "readme.txt", "text/plain"),
            ],
        );
        client.insert_children(
            Some(&folder_id("A")),
            vec![MemoryResourceClient::file_item(
                "F2",
                "plan.pdf",
                "application/pdf",
            )],
        );
        client
    }

    fn navigator(client: Arc<MemoryResourceClient>) -> DriveNavigator {
        let state: SharedState = Arc::new(RwLock::new(SessionState::default()));
        DriveNavigator::new(client, state)
    }

    #[tokio::test]
    async fn test_open_folder_replaces_listing() {
        let client = seeded_client();
        let nav = navigator(client);

        nav.refresh().await.unwrap();
        assert_eq!(nav.state.read().await.listing.len(), 2);

        nav.open_folder(folder_id("A")).await.unwrap();
        let listing = nav.state.read().await.listing.clone();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].name, "plan.pdf");
        assert_eq!(nav.depth().await, 1);
    }

    #[tokio::test]
    async fn test_open_then_back_round_trips_listing() {
        let client = seeded_client();
        let nav = navigator(client);

        nav.refresh().await.unwrap();
        let before = nav.state.read().await.listing.clone();

        nav.open_folder(folder_id("A")).await.unwrap();
        nav.go_back().await.unwrap();

        assert_eq!(nav.state.read().await.listing.clone(), before);
        assert_eq!(nav.depth().await, 0);
    }

    #[tokio::test]
    async fn test_go_back_on_empty_stack_stays_at_root() {
        let client = seeded_client();
        let nav = navigator(client.clone());

        nav.go_back().await.unwrap();

        assert_eq!(nav.depth().await, 0);
        // Degrades to a root fetch rather than popping into nothing
        assert_eq!(nav.state.read().await.listing.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_navigation_keeps_previous_listing() {
        let client = seeded_client();
        let nav = navigator(client);

        nav.refresh().await.unwrap();
        let before = nav.state.read().await.listing.clone();

        // Unknown folder: the fetch fails, the listing must not change
        let result = nav.open_folder(folder_id("missing")).await;
        assert!(result.is_err());
        assert_eq!(nav.state.read().await.listing.clone(), before);
    }

    #[tokio::test]
    async fn test_upload_success_refetches_target_once() {
        let client = seeded_client();
        let nav = navigator(client.clone());

        nav.open_folder(folder_id("A")).await.unwrap();
        let fetches_before = client.listing_fetches();

        nav.upload("notes.txt", "text/plain", b"hi".to_vec())
            .await
            .unwrap();

        assert_eq!(client.listing_fetches(), fetches_before + 1);

        let state = nav.state.read().await;
        let notice = state.notice.clone().unwrap();
        assert_eq!(notice.kind, crate::state::NoticeKind::Success);
        assert!(state.listing.iter().any(|item| item.name == "notes.txt"));
    }

    #[tokio::test]
    async fn test_upload_failure_leaves_listing_untouched() {
        let client = seeded_client();
        let nav = navigator(client.clone());

        nav.refresh().await.unwrap();
        let before = nav.state.read().await.listing.clone();
        let fetches_before = client.listing_fetches();

        client.set_failing(inboxdrive_graph::Call::Upload, true);
        let result = nav.upload("notes.txt", "text/plain", b"hi".to_vec()).await;

        assert!(result.is_err());
        assert_eq!(client.listing_fetches(), fetches_before);

        let state = nav.state.read().await;
        assert_eq!(state.notice.clone().unwrap().kind, crate::state::NoticeKind::Error);
        assert_eq!(state.listing, before);
    }

    proptest! {
        // Depth after any open/back sequence is (#opens - #backs) clamped at 0.
        #[test]
        fn depth_follows_open_minus_back(ops in proptest::collection::vec(any::<bool>(), 0..32)) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let client = seeded_client();
                let nav = navigator(client);

                let mut expected: usize = 0;
                for open in &ops {
                    if *open {
                        let _ = nav.open_folder(folder_id("A")).await;
                        expected += 1;
                    } else {
                        let _ = nav.go_back().await;
                        expected = expected.saturating_sub(1);
                    }
                }

                assert_eq!(nav.depth().await, expected);
            });
        }
    }
}
