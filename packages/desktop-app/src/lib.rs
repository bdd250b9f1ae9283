//! Notefold Desktop Shell
//!
//! Headless host process for the notes UI. It owns exactly three things:
//!
//! - [`settings`] - the persistent `{ "notesFolder": ... }` settings file
//! - [`config`] - where that file lives for this process
//! - [`bridge`] - the four-operation stdio surface the UI talks to
//!
//! Everything note-shaped (model, folder format, ordering) lives in
//! `notefold-core`; this crate only wires a folder choice to it.

pub mod bridge;
pub mod config;
pub mod settings;
