//! Notefold Core
//!
//! This crate provides the note model, storage backends, and collection
//! lifecycle for the Notefold note-taking app.
//!
//! # Architecture
//!
//! - **One collection**: the unit of persistence is always the full notes
//!   collection; stores replace previous state wholesale
//! - **Never-raise storage**: loading falls back to empty, saving to a
//!   no-op; failures are logged, never surfaced
//! - **Hydration gate**: nothing persists until the initial load completes
//! - **Coalesced saves**: mutations are synchronous in memory and hand
//!   snapshots to one background persister, newest snapshot wins
//!
//! # Modules
//!
//! - [`models`] - Data structures (Note, NotePatch, Theme) and pure helpers
//! - [`storage`] - The `NotesStore` contract and its two backends
//! - [`services`] - `NotesService` lifecycle and domain events

pub mod models;
pub mod services;
pub mod storage;

// Re-export commonly used types
pub use models::*;
pub use services::*;
pub use storage::*;
