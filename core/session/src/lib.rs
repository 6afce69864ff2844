//! Session core for InboxDrive.
//!
//! This module ties the credential provider and the resource client
//! together into a user session: sign-in populates the session state with
//! four concurrent fetches, the drive navigator walks the folder
//! hierarchy, and sign-out tears everything down. The presentation layer
//! only ever observes snapshots of the state produced here.

pub mod navigator;
pub mod orchestrator;
pub mod state;

pub use navigator::DriveNavigator;
pub use orchestrator::Session;
pub use state::{Notice, NoticeKind, SessionState};
