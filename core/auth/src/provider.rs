//! Credential provider trait definition.

use async_trait::async_trait;

use inboxdrive_common::Result;

/// Delegated permissions requested together at sign-in time.
///
/// Read the signed-in profile, read and write drive files, read mail.
pub const DEFAULT_SCOPES: &[&str] = &["User.Read", "Files.ReadWrite", "Mail.Read"];

/// Capability for signing in, signing out, and silently acquiring tokens.
///
/// Implementations own their token cache; callers never see refresh tokens
/// or expiry bookkeeping, only opaque access tokens.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Interactive sign-in.
    ///
    /// # Postconditions
    /// - On success, `is_signed_in` returns true and `acquire_token`
    ///   can produce access tokens without further interaction
    ///
    /// # Errors
    /// - User abandoned or failed the sign-in flow
    /// - Network errors while exchanging credentials
    async fn login(&self) -> Result<()>;

    /// Sign out, discarding all cached credentials.
    async fn logout(&self) -> Result<()>;

    /// Whether a signed-in account is currently available.
    async fn is_signed_in(&self) -> bool;

    /// Silently acquire an access token for the given scopes.
    ///
    /// Returns a cached token while it is still valid and refreshes it
    /// otherwise, without user interaction.
    ///
    /// # Errors
    /// - No signed-in account
    /// - The cached token expired and cannot be refreshed silently
    async fn acquire_token(&self, scopes: &[&str]) -> Result<String>;
}
