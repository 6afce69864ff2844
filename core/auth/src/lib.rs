//! Credential provider abstraction for InboxDrive.
//!
//! This module wraps sign-in, sign-out, and silent token acquisition behind
//! a single capability trait so the rest of the application never reads
//! ambient identity state. The Microsoft identity platform implementation
//! performs the OAuth2 authorization-code flow with a localhost redirect;
//! the fixed implementation backs deterministic tests.

pub mod fixed;
pub mod microsoft;
pub mod provider;

pub use fixed::FixedCredentialProvider;
pub use microsoft::{AuthConfig, MicrosoftProvider, Tokens};
pub use provider::{CredentialProvider, DEFAULT_SCOPES};
