//! Integration tests for pdfsync-sync
//!
//! Drives the engine, archiver and orchestrator against an in-memory remote
//! and manifest store, with real files in temporary directories.


mod test_engine;
mod test_orchestrator;
