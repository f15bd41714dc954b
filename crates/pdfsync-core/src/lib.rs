//! PDFSync Core - Domain types and port definitions
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - `RemoteFile`, `Manifest` and its entries, `ValidationResult`, `SyncOutcome`
//! - **Port definitions** - Traits for adapters: `IRemoteClient`, `IAuthProvider`, `IManifestStore`, `IRunObserver`
//! - **Configuration** - The typed YAML configuration shared by every crate
//!
//! # Architecture
//!
//! The domain module holds plain data with no I/O. Ports define the trait
//! interfaces that adapter crates implement (the Google Drive client, the JSON
//! manifest store, the console observer). The sync crate drives the domain
//! through these ports.

pub mod config;
pub mod domain;
pub mod ports;
