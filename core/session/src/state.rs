//! Session state observed by the presentation layer.

use std::sync::Arc;
use tokio::sync::RwLock;

use inboxdrive_graph::{ListingItem, MessageSummary, Profile, StorageQuota};

/// Kind of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// One-shot user-facing notice, e.g. the outcome of an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub(crate) fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub(crate) fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

/// Everything the presentation layer renders.
///
/// All fields are session-scoped: populated at or after sign-in,
/// discarded wholesale at sign-out. A slot left at its default means the
/// corresponding fetch has not succeeded (yet).
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Whether a signed-in account backs this session.
    pub signed_in: bool,
    /// True from sign-in until all initial fetches have settled.
    pub loading: bool,
    /// The signed-in user's profile.
    pub profile: Option<Profile>,
    /// Children of the currently viewed folder.
    pub listing: Vec<ListingItem>,
    /// Drive storage quota.
    pub quota: Option<StorageQuota>,
    /// Recent messages, fetched once per session.
    pub messages: Vec<MessageSummary>,
    /// Pending notice, taken by the presentation layer.
    pub notice: Option<Notice>,
}

/// State handle shared between the orchestrator and the navigator.
pub(crate) type SharedState = Arc<RwLock<SessionState>>;
