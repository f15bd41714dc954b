//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the sync engine
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IRemoteClient`] - Listing, downloading and moving remote files
//! - [`IAuthProvider`] - Produces an authenticated [`IRemoteClient`]
//! - [`IManifestStore`] - Durable storage for the sync manifest
//! - [`IRunObserver`] - Immediate per-file progress reporting

pub mod auth_provider;
pub mod manifest_store;
pub mod remote_client;
pub mod run_observer;

pub use auth_provider::{IAuthProvider, Tokens};
pub use manifest_store::IManifestStore;
pub use remote_client::{IRemoteClient, ORDER_BY_MODIFIED_DESC, PDF_MIME_TYPE};
pub use run_observer::{IRunObserver, NoopObserver};
