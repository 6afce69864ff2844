//! Remote resource access for InboxDrive.
//!
//! This module provides a trait-based interface over the productivity API
//! the application displays: the signed-in profile, the drive hierarchy,
//! the storage quota, and the recent mailbox.
//!
//! # Design Principles
//! - One seam: the orchestrator and navigator depend on `ResourceClient`,
//!   never on HTTP details
//! - Typed payloads: optional wire fields are modeled as `Option`, with
//!   defaulting applied in one place
//! - Async operations: all calls are async and carry their own token
//!   acquisition

pub mod client;
pub mod memory;
mod model;
pub mod service;

pub use client::GraphClient;
pub use memory::{Call, MemoryResourceClient};
pub use service::{ListingItem, MessageSummary, Profile, ResourceClient, StorageQuota};
