//! Fixed credential provider for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};

use inboxdrive_common::{Error, Result};

use crate::provider::CredentialProvider;

/// Credential provider that hands out a fixed token.
///
/// Useful for testing and development. Silent acquisition can be made to
/// fail on demand to exercise the signed-in-but-empty path.
pub struct FixedCredentialProvider {
    token: String,
    signed_in: AtomicBool,
    fail_acquire: AtomicBool,
}

impl FixedCredentialProvider {
    /// Create a signed-out provider with the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            signed_in: AtomicBool::new(false),
            fail_acquire: AtomicBool::new(false),
        }
    }

    /// Create a provider that already has a signed-in account.
    pub fn signed_in(token: impl Into<String>) -> Self {
        let provider = Self::new(token);
        provider.signed_in.store(true, Ordering::SeqCst);
        provider
    }

    /// Make silent token acquisition fail (or succeed again).
    pub fn set_fail_acquire(&self, fail: bool) {
        self.fail_acquire.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CredentialProvider for FixedCredentialProvider {
    async fn login(&self) -> Result<()> {
        self.signed_in.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn logout(&self) -> Result<()> {
        self.signed_in.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn is_signed_in(&self) -> bool {
        self.signed_in.load(Ordering::SeqCst)
    }

    async fn acquire_token(&self, _scopes: &[&str]) -> Result<String> {
        if self.fail_acquire.load(Ordering::SeqCst) {
            return Err(Error::Authentication(
                "Silent token acquisition disabled".to_string(),
            ));
        }
        if !self.signed_in.load(Ordering::SeqCst) {
            return Err(Error::Authentication(
                "Silent token acquisition requires a signed-in account".to_string(),
            ));
        }
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_before_login_fails() {
        let provider = FixedCredentialProvider::new("token");
        assert!(provider.acquire_token(&["User.Read"]).await.is_err());
    }

    #[tokio::test]
    async fn test_login_then_acquire() {
        let provider = FixedCredentialProvider::new("token");
        provider.login().await.unwrap();

        assert!(provider.is_signed_in().await);
        assert_eq!(provider.acquire_token(&["User.Read"]).await.unwrap(), "token");
    }

    #[tokio::test]
    async fn test_logout_clears_account() {
        let provider = FixedCredentialProvider::signed_in("token");
        provider.logout().await.unwrap();

        assert!(!provider.is_signed_in().await);
        assert!(provider.acquire_token(&["User.Read"]).await.is_err());
    }

    #[tokio::test]
    async fn test_injected_acquire_failure() {
        let provider = FixedCredentialProvider::signed_in("token");
        provider.set_fail_acquire(true);

        assert!(provider.acquire_token(&["User.Read"]).await.is_err());

        provider.set_fail_acquire(false);
        assert!(provider.acquire_token(&["User.Read"]).await.is_ok());
    }
}
