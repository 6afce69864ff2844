//! Session orchestration: sign-in fan-out and sign-out teardown.

use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use inboxdrive_auth::{CredentialProvider, DEFAULT_SCOPES};
use inboxdrive_common::Result;
use inboxdrive_graph::ResourceClient;

use crate::navigator::DriveNavigator;
use crate::state::{Notice, SessionState};

/// Number of recent messages fetched at sign-in.
const RECENT_MESSAGE_COUNT: usize = 10;

/// A signed-in user's session.
///
/// Owns the shared session state and the injected credential provider and
/// resource client. A session is single-use: once signed out it cannot be
/// signed in again; construct a new one instead.
pub struct Session {
    credentials: Arc<dyn CredentialProvider>,
    client: Arc<dyn ResourceClient>,
    state: Arc<RwLock<SessionState>>,
    navigator: DriveNavigator,
    cancel: CancellationToken,
}

impl Session {
    /// Create a session over the given provider and client.
    pub fn new(
        credentials: Arc<dyn CredentialProvider>,
        client: Arc<dyn ResourceClient>,
    ) -> Self {
        let state = Arc::new(RwLock::new(SessionState::default()));
        let navigator = DriveNavigator::new(client.clone(), state.clone());

        Self {
            credentials,
            client,
            state,
            navigator,
            cancel: CancellationToken::new(),
        }
    }

    /// The drive navigator bound to this session.
    pub fn navigator(&self) -> &DriveNavigator {
        &self.navigator
    }

    /// Sign in and populate the session state.
    ///
    /// Performs interactive login when no account is present yet, then
    /// acquires a token silently and issues the four initial fetches
    /// (profile, root listing, quota, recent messages) concurrently.
    /// Failures are isolated per fetch: each is logged and leaves its own
    /// slot at the default without affecting its siblings. The loading
    /// flag clears only once all four have settled.
    ///
    /// # Errors
    /// - Interactive login failed
    /// - Silent token acquisition failed; the session stays signed in but
    ///   empty and no fetch is issued
    pub async fn sign_in(&self) -> Result<()> {
        if !self.credentials.is_signed_in().await {
            self.credentials.login().await?;
        }

        {
            let mut state = self.state.write().await;
            state.signed_in = true;
            state.loading = true;
        }

        // Gate: without a token there is no point issuing any fetch.
        if let Err(e) = self.credentials.acquire_token(DEFAULT_SCOPES).await {
            warn!("Token acquisition failed: {}", e);
            self.state.write().await.loading = false;
            return Err(e);
        }

        // The root listing goes through the navigator so its generation
        // guard also covers the initial fetch.
        let fetches = async {
            tokio::join!(
                self.client.profile(),
                self.navigator.refresh(),
                self.client.quota(),
                self.client.recent_messages(RECENT_MESSAGE_COUNT),
            )
        };

        let (profile, listing, quota, messages) = tokio::select! {
            results = fetches => results,
            _ = self.cancel.cancelled() => {
                debug!("Sign-in fan-out cancelled");
                self.state.write().await.loading = false;
                return Ok(());
            }
        };

        {
            let mut state = self.state.write().await;
            match profile {
                Ok(profile) => state.profile = Some(profile),
                Err(e) => warn!("Profile fetch failed: {}", e),
            }
            if let Err(e) = listing {
                warn!("Drive listing fetch failed: {}", e);
            }
            match quota {
                Ok(quota) => state.quota = Some(quota),
                Err(e) => warn!("Quota fetch failed: {}", e),
            }
            match messages {
                Ok(messages) => state.messages = messages,
                Err(e) => warn!("Mailbox fetch failed: {}", e),
            }
            state.loading = false;
        }

        info!("Session ready");
        Ok(())
    }

    /// Sign out: abort in-flight work, log out of the credential provider,
    /// and reset the session state.
    pub async fn sign_out(&self) -> Result<()> {
        self.cancel.cancel();
        self.credentials.logout().await?;
        *self.state.write().await = SessionState::default();
        info!("Signed out");
        Ok(())
    }

    /// Whether the initial fetches are still in flight.
    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    /// Clone of the current session state for rendering.
    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Take the pending notice, if any.
    pub async fn take_notice(&self) -> Option<Notice> {
        self.state.write().await.notice.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inboxdrive_auth::FixedCredentialProvider;
    use inboxdrive_graph::{Call, MemoryResourceClient, MessageSummary, StorageQuota};

    fn seeded_client() -> Arc<MemoryResourceClient> {
        let client = Arc::new(MemoryResourceClient::new());
        client.insert_children(
            None,
            vec![
                MemoryResourceClient::folder_item("A", "Projects"),
                MemoryResourceClient::file_item("F1", "readme.txt", "text/plain"),
            ],
        );
        client.set_quota(StorageQuota {
            used: 512,
            total: 2048,
        });
        client.set_messages(vec![
            MessageSummary {
                id: "MSG1".to_string(),
                subject: Some("Hello".to_string()),
                sender: Some("a@example.com".to_string()),
                received_at: chrono::Utc::now(),
            },
            MessageSummary {
                id: "MSG2".to_string(),
                subject: None,
                sender: None,
                received_at: chrono::Utc::now(),
            },
        ]);
        client
    }

    fn session_over(client: Arc<MemoryResourceClient>) -> Session {
        Session::new(Arc::new(FixedCredentialProvider::signed_in("token")), client)
    }

    #[tokio::test]
    async fn test_sign_in_populates_all_slots() {
        let client = seeded_client();
        let session = session_over(client);

        session.sign_in().await.unwrap();

        let state = session.snapshot().await;
        assert!(state.signed_in);
        assert!(!state.loading);
        assert_eq!(state.profile.unwrap().name, "Memory User");
        assert_eq!(state.listing.len(), 2);
        assert_eq!(state.quota.unwrap().used, 512);
        assert_eq!(state.messages.len(), 2);
    }

    #[tokio::test]
    async fn test_sign_in_logs_in_first_when_signed_out() {
        let provider = Arc::new(FixedCredentialProvider::new("token"));
        let session = Session::new(provider.clone(), seeded_client());

        session.sign_in().await.unwrap();

        assert!(provider.is_signed_in().await);
        assert!(session.snapshot().await.signed_in);
    }

    #[tokio::test]
    async fn test_fan_out_isolates_branch_failure() {
        let client = seeded_client();
        client.set_failing(Call::Messages, true);
        let session = session_over(client);

        session.sign_in().await.unwrap();

        let state = session.snapshot().await;
        // The failed slot stays at its default; the rest populate
        assert!(state.messages.is_empty());
        assert!(state.profile.is_some());
        assert!(state.quota.is_some());
        assert_eq!(state.listing.len(), 2);
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_three_of_four_failing_still_clears_loading() {
        let client = seeded_client();
        client.set_failing(Call::Profile, true);
        client.set_failing(Call::Quota, true);
        client.set_failing(Call::Messages, true);
        let session = session_over(client);

        session.sign_in().await.unwrap();

        let state = session.snapshot().await;
        assert!(!state.loading);
        assert!(state.profile.is_none());
        assert!(state.quota.is_none());
        assert!(state.messages.is_empty());
        assert_eq!(state.listing.len(), 2);
    }

    #[tokio::test]
    async fn test_token_failure_issues_no_fetches() {
        let client = seeded_client();
        let provider = Arc::new(FixedCredentialProvider::signed_in("token"));
        provider.set_fail_acquire(true);
        let session = Session::new(provider, client.clone());

        let result = session.sign_in().await;
        assert!(result.is_err());

        let state = session.snapshot().await;
        // Signed in but empty, loading cleared, nothing fetched
        assert!(state.signed_in);
        assert!(!state.loading);
        assert!(state.profile.is_none());
        assert!(state.listing.is_empty());
        assert_eq!(client.listing_fetches(), 0);
    }

    #[tokio::test]
    async fn test_sign_out_resets_state() {
        let client = seeded_client();
        let provider = Arc::new(FixedCredentialProvider::signed_in("token"));
        let session = Session::new(provider.clone(), client);

        session.sign_in().await.unwrap();
        session.sign_out().await.unwrap();

        let state = session.snapshot().await;
        assert!(!state.signed_in);
        assert!(state.profile.is_none());
        assert!(state.listing.is_empty());
        assert!(state.messages.is_empty());
        assert!(!provider.is_signed_in().await);
    }

    #[tokio::test]
    async fn test_upload_notice_is_taken_once() {
        let client = seeded_client();
        let session = session_over(client);

        session.sign_in().await.unwrap();
        session
            .navigator()
            .upload("notes.txt", "text/plain", b"hi".to_vec())
            .await
            .unwrap();

        let notice = session.take_notice().await.unwrap();
        assert_eq!(notice.kind, crate::state::NoticeKind::Success);
        assert!(session.take_notice().await.is_none());
    }
}
