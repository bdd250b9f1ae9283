//! Business Services
//!
//! This module contains the core business logic services:
//!
//! - `NotesService` - owns the in-memory collection, its lifecycle, and the
//!   coalesced background persistence
//! - `NotesEvent` - broadcast domain events for observers
//!
//! Services coordinate between the storage layer and any host surface,
//! implementing the ordering and persistence rules the collection lives by.

mod events;
mod notes_service;

pub use events::NotesEvent;
pub use notes_service::NotesService;
